//! Basic example demonstrating DL and CA round trips.
//!
//! Run with: cargo run --example basic

use dlca::aead::OsRandom;
use dlca::ca::{self, CaSettings};
use dlca::dl::{self, DlEntry, DlSettings};
use dlca::{Archive, ArchiveEntry};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    println!("=== dlca Basic Example ===\n");

    println!("1. DL container (a flat list of entries)...");
    dl_roundtrip()?;

    println!("\n2. CA container (a directory tree)...");
    ca_roundtrip()?;

    println!("\nExample complete.");
    Ok(())
}

fn dl_roundtrip() -> Result<(), Box<dyn Error>> {
    let entries = vec![
        DlEntry::Raw(b"first entry".to_vec()),
        DlEntry::Raw(b"second entry".to_vec()),
    ];

    let mut buf = Vec::new();
    dl::write(&mut buf, &entries, &DlSettings::default(), &OsRandom)?;
    println!("   wrote {} bytes", buf.len());

    let decoded = dl::read(&mut &buf[..], None)?;
    for (i, entry) in decoded.entries.iter().enumerate() {
        if let DlEntry::Raw(data) = entry {
            println!("   entry {i}: {}", String::from_utf8_lossy(data));
        }
    }

    Ok(())
}

fn ca_roundtrip() -> Result<(), Box<dyn Error>> {
    let mut archive = Archive::new();
    archive.add_file(ArchiveEntry::file(
        "readme.txt",
        b"This is a readme file for the basic example.".to_vec(),
    ))?;
    archive.add_file(ArchiveEntry::file(
        "docs/notes.md",
        b"# Notes\n\nThis is a markdown file.".to_vec(),
    ))?;

    let mut buf = Vec::new();
    ca::write(&mut buf, &archive, &CaSettings::default(), &OsRandom)?;
    println!("   wrote {} bytes", buf.len());

    let decoded = ca::read(&mut &buf[..], None)?;
    println!("   entries in archive:");
    for entry in decoded.entries() {
        println!("     - {}", entry.path);
    }

    let readme = decoded.lookup("readme.txt").expect("readme.txt present");
    println!("\n   readme.txt: {}", String::from_utf8_lossy(&readme.data));

    Ok(())
}
