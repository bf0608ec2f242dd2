// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    for name in sodeps::inspect::parse_readelf_output(data) {
        assert!(!name.contains('\n'));
    }
});
