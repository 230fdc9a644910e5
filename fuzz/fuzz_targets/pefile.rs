#![no_main]

use libfuzzer_sys::fuzz_target;
use dotsig::PeFile;

fuzz_target!(|data: &[u8]| {
    if let Ok(file) = PeFile::from_mem(data.to_vec()) {
        if let Ok(blob) = file.blob_heap() {
            for entry in &blob {
                if entry.is_err() {
                    break;
                }
            }
        }
    }
});
