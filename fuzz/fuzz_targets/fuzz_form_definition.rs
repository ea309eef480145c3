//! Fuzz target: JSON deserialization of `FormDefinition`.
//!
//! Parsing must never panic; a definition that parses and validates must then
//! evaluate against an empty submission.

#![no_main]

use gatehouse_core::{evaluate, FormDefinition, Submission};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(form) = serde_json::from_slice::<FormDefinition>(data) else {
        return;
    };
    if form.validate().is_err() {
        return;
    }
    let states = evaluate(&form, &Submission::new());
    assert_eq!(states.len(), form.fields.len(), "one state per field");
});
