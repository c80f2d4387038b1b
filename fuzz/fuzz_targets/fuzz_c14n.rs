#![no_main]

use libfuzzer_sys::fuzz_target;
use sefaz_dfe::xml::{NamespaceScope, canonicalize, parse};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(el) = parse(s) {
            // Canonical output must itself be well-formed and stable.
            let once = canonicalize(&el, &NamespaceScope::new());
            let reparsed = parse(&once).expect("canonical form must parse");
            assert_eq!(once, canonicalize(&reparsed, &NamespaceScope::new()));
        }
    }
});
