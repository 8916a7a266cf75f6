#![no_main]

use libfuzzer_sys::fuzz_target;
use spvscope::{ir::Module, ir::Version, ValidationConfig};

// Each instruction is one little-endian header word (word count << 16 | opcode) followed by its
// operand words, as in the binary encoding.
fuzz_target!(|data: &[u8]| {
    let words: Vec<u32> = data
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    let mut stream = Vec::new();
    let mut offset = 0;
    while offset < words.len() {
        let header = words[offset];
        let count = ((header >> 16) as usize).max(1);
        let end = (offset + count).min(words.len());
        stream.push(((header & 0xffff) as u16, words[offset + 1..end].to_vec()));
        offset += count;
    }

    if let Ok(module) = Module::from_raw(Version::V1_6, stream) {
        let config = ValidationConfig {
            continue_after_error: true,
            ..ValidationConfig::default()
        };
        let _ = module.validate(config);
        let _ = spvscope::validation::ValidationEngine::new(&module, &config).collect();
    }
});
