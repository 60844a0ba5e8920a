use keystore_bootstrap::{generate, keystore};

fn main() {
    let mut args = std::env::args().skip(1);
    let (Some(cert), Some(key), Some(out)) = (args.next(), args.next(), args.next()) else {
        eprintln!("usage: generate_keystore <cert.pem> <key.pem> <out.p12>");
        std::process::exit(2);
    };

    // Build a keystore from the PEM pair
    generate(&cert, &key, &out, "changeit", "tls-server").unwrap();

    // Open it again to show what was stored
    let contents = keystore::open(&out, "changeit").unwrap();
    let summary = contents.certificate.summary().unwrap();

    println!("Alias: {:?}", contents.alias);
    println!("Subject: {}", summary.subject);
    println!("Key matches certificate: {}", contents.key_matches_certificate());
}
