#![no_main]

use libfuzzer_sys::fuzz_target;
use dotsig::metadata::{
    signatures::{
        encode_method_signature, encode_type_signature, parse_method_signature,
        parse_type_signature,
    },
    typesystem::NullResolver,
};

fuzz_target!(|data: &[u8]| {
    if let Ok(signature) = parse_type_signature(data, &NullResolver) {
        let encoded = encode_type_signature(&signature).unwrap();
        let decoded = parse_type_signature(&encoded, &NullResolver).unwrap();
        assert_eq!(decoded, signature);
    }

    if let Ok(method) = parse_method_signature(data, &NullResolver) {
        let encoded = encode_method_signature(&method).unwrap();
        let decoded = parse_method_signature(&encoded, &NullResolver).unwrap();
        assert_eq!(decoded, method);
    }
});
