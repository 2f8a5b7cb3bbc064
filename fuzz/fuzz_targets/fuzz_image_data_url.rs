#![no_main]

use libfuzzer_sys::fuzz_target;

use facegate_types::ImageBlob;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(blob) = ImageBlob::from_data_url(text) {
        assert!(!blob.is_empty());
        assert!(!blob.mime_type().is_empty());
    }
});
