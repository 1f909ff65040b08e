use pe_authenticode::Mode;

fn main() {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .expect("usage: extract_signature <path-to-pe>");
    let data = std::fs::read(path).unwrap();

    let facts = pe_authenticode::parse(&data, Mode::READ_CODE_SIGNATURE).unwrap();

    if !facts.has_signature {
        println!("not signed");
        return;
    }

    match facts.cms_signature_blob {
        Some(blob) => {
            println!("PKCS#7 SignedData: {} bytes", blob.len());
            std::io::Write::write_all(&mut std::io::stdout(), &blob).unwrap();
        }
        None => println!("signed, but certificate blob was not extracted"),
    }
}
