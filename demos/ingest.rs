//! Example demonstrating recursive ingestion of a directory tree into a
//! CA archive via [`dlca::fs::StdFileSystem`].
//!
//! Run with: cargo run --example ingest

use dlca::aead::OsRandom;
use dlca::ca::{self, CaSettings};
use dlca::fs::StdFileSystem;
use dlca::{ingest, FileSystem, IngestOptions};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    println!("=== dlca Ingest Example ===\n");

    println!("1. Building a sample directory tree...");
    let dir = tempfile::tempdir()?;
    let vfs = StdFileSystem::new(dir.path());
    vfs.write("src/main.rs", b"fn main() {}")?;
    vfs.write("src/lib.rs", b"pub fn add(a: i32, b: i32) -> i32 { a + b }")?;
    vfs.write("README.md", b"# sample project")?;
    println!("   created under {}", dir.path().display());

    println!("\n2. Walking the tree into an archive...");
    let archive = ingest(&vfs, "", &IngestOptions::default())?;
    println!("   entries discovered:");
    for entry in archive.entries() {
        println!("     - {}", entry.path);
    }

    println!("\n3. Writing it out as a CA container...");
    let mut buf = Vec::new();
    ca::write(&mut buf, &archive, &CaSettings::default(), &OsRandom)?;
    println!("   wrote {} bytes", buf.len());

    println!("\n4. Reading it back and checking contents match...");
    let decoded = ca::read(&mut &buf[..], None)?;
    let lib_rs = decoded.lookup("src/lib.rs").expect("src/lib.rs present");
    println!("   src/lib.rs: {}", String::from_utf8_lossy(&lib_rs.data));

    Ok(())
}
