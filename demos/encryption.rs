//! Example demonstrating AES-256-GCM encrypted CA archives, including
//! what happens when a reader presents the wrong key.
//!
//! Run with: cargo run --example encryption

use dlca::aead::{self, OsRandom};
use dlca::ca::{self, CaSettings};
use dlca::{Archive, ArchiveEntry, EncryptionKind};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    println!("=== dlca Encryption Example ===\n");

    let key = [0x42u8; aead::KEY_LEN];

    println!("1. Writing an AES-256-GCM encrypted archive...");
    let mut archive = Archive::new();
    archive.add_file(ArchiveEntry::file(
        "important.txt",
        b"This data is sealed under AES-256-GCM.".to_vec(),
    ))?;

    let settings = CaSettings {
        encryption: EncryptionKind::Aes256Gcm,
        key: Some(key),
        ..Default::default()
    };
    let mut buf = Vec::new();
    ca::write(&mut buf, &archive, &settings, &OsRandom)?;
    println!("   wrote {} encrypted bytes", buf.len());

    println!("\n2. Reading it back with the correct key...");
    let decoded = ca::read(&mut &buf[..], Some(&key))?;
    let important = decoded.lookup("important.txt").expect("entry present");
    println!("   important.txt: {}", String::from_utf8_lossy(&important.data));

    println!("\n3. Reading it back with the wrong key...");
    let wrong_key = [0x99u8; aead::KEY_LEN];
    match ca::read(&mut &buf[..], Some(&wrong_key)) {
        Ok(_) => println!("   unexpected: decrypted with the wrong key"),
        Err(e) => println!("   rejected as expected: {e}"),
    }

    println!("\n4. Reading it back with no key at all...");
    match ca::read(&mut &buf[..], None) {
        Ok(_) => println!("   unexpected: decrypted with no key"),
        Err(e) => println!("   rejected as expected: {e}"),
    }

    println!("\n5. Writing with no key supplied generates one...");
    let mut archive2 = Archive::new();
    archive2.add_file(ArchiveEntry::file("generated.txt", b"auto-keyed".to_vec()))?;
    let generated_settings = CaSettings {
        encryption: EncryptionKind::Aes256Gcm,
        key: None,
        ..Default::default()
    };
    let mut buf2 = Vec::new();
    let generated_key = ca::write(&mut buf2, &archive2, &generated_settings, &OsRandom)?
        .expect("write generates a key when none is supplied");
    let decoded2 = ca::read(&mut &buf2[..], Some(&generated_key))?;
    println!(
        "   generated.txt: {}",
        String::from_utf8_lossy(&decoded2.lookup("generated.txt").unwrap().data)
    );

    Ok(())
}
