#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(el) = sefaz_dfe::xml::parse(s) {
            let _ = sefaz_dfe::distribution::parse_response(&el);
            let _ = sefaz_dfe::events::parse_response(&el);
        }
    }
});
