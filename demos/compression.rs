//! Example comparing Brotli-11 (best ratio) against Brotli-1 (fast) for
//! a CA archive's data region.
//!
//! Run with: cargo run --example compression

use dlca::aead::OsRandom;
use dlca::ca::{self, CaSettings};
use dlca::{Archive, ArchiveEntry, CompressionKind};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    println!("=== dlca Compression Example ===\n");

    let medium_text = "Lorem ipsum ".repeat(500); // ~6KB, compresses well
    let large_data = vec![0u8; 100_000]; // 100KB of zeros, compresses extremely well

    println!("1. Writing the same archive under each compression kind...\n");
    let none = write_with(CompressionKind::None, &medium_text, &large_data)?;
    let brotli1 = write_with(CompressionKind::Brotli1, &medium_text, &large_data)?;
    let brotli11 = write_with(CompressionKind::Brotli11, &medium_text, &large_data)?;

    println!("\n2. Comparing sizes:");
    println!("   None:      {:>8} bytes", none.len());
    println!(
        "   Brotli-1:  {:>8} bytes ({:.1}% of uncompressed)",
        brotli1.len(),
        (brotli1.len() as f64 / none.len() as f64) * 100.0
    );
    println!(
        "   Brotli-11: {:>8} bytes ({:.1}% of uncompressed)",
        brotli11.len(),
        (brotli11.len() as f64 / none.len() as f64) * 100.0
    );

    println!("\n3. Verifying both compressed archives decode back to the source data...");
    let decoded1 = ca::read(&mut &brotli1[..], None)?;
    let decoded11 = ca::read(&mut &brotli11[..], None)?;
    assert_eq!(decoded1.lookup("medium.txt").unwrap().data, medium_text.as_bytes());
    assert_eq!(decoded11.lookup("medium.txt").unwrap().data, medium_text.as_bytes());
    println!("   both match the source");

    Ok(())
}

fn write_with(
    compression: CompressionKind,
    medium_text: &str,
    large_data: &[u8],
) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut archive = Archive::new();
    archive.add_file(ArchiveEntry::file("medium.txt", medium_text.as_bytes().to_vec()))?;
    archive.add_file(ArchiveEntry::file("large.bin", large_data.to_vec()))?;

    let settings = CaSettings {
        compression,
        ..Default::default()
    };
    let mut buf = Vec::new();
    ca::write(&mut buf, &archive, &settings, &OsRandom)?;
    Ok(buf)
}
