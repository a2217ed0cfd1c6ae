// SPDX-License-Identifier: AGPL-3.0-or-later
#![no_main]

use libfuzzer_sys::fuzz_target;
use remarkup_core::xml::tokenize;
use remarkup_core::RemarkupEngine;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let engine = RemarkupEngine::new();

    let output = engine.parse(input);
    let _ = output.word_count();

    // Arbitrary input as translator output
    let _ = tokenize(input);
    let _ = engine.from_xml(input);

    // Exported documents always import again
    let xml = engine.to_xml(input);
    assert!(engine.from_xml(&xml).is_ok(), "export of {input:?} does not import");
});
