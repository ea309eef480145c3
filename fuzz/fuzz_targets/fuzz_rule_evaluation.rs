//! Fuzz target: dynamic field rule evaluation over arbitrary submissions.

#![no_main]

use gatehouse_core::{evaluate, missing_required, samples::sample_forms, Submission};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(submission) = serde_json::from_slice::<Submission>(data) else {
        return;
    };
    for form in sample_forms() {
        let states = evaluate(&form, &submission);
        for name in missing_required(&form, &submission) {
            assert!(
                states.get(&name).is_some_and(|s| s.visible && s.required),
                "{name} reported missing while optional or hidden"
            );
        }
    }
});
