use pe_authenticode::Mode;

fn main() {
    env_logger::init();

    let path = std::env::args().nth(1).expect("usage: dump <path-to-pe>");
    let data = std::fs::read(path).unwrap();

    let facts = pe_authenticode::parse(&data, Mode::DEFAULT).unwrap();

    println!("{:#?}", facts);
}
