#![no_main]

use libfuzzer_sys::fuzz_target;

use facegate_token::{SigningSecret, TokenValidator};
use facegate_types::Timestamp;

// Arbitrary strings must be rejected or accepted, never panic, in both
// trust modes.
fuzz_target!(|data: &[u8]| {
    let Ok(token) = std::str::from_utf8(data) else {
        return;
    };
    let now = Timestamp::from_secs(1_700_000_000);

    let verifying = TokenValidator::hs256(SigningSecret::new(b"fuzz-secret".to_vec()));
    let _ = verifying.validate_at(token, now);

    let decode_only = TokenValidator::decode_only_insecure();
    if let Ok(validated) = decode_only.validate_at(token, now) {
        assert!(validated.subject_id.get() > 0);
    }
});
