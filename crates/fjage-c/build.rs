// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(e) = try_main() {
        eprintln!("Error generating fjage.h: {e}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), Box<dyn std::error::Error>> {
    let crate_dir = env::var("CARGO_MANIFEST_DIR")?;
    let header = PathBuf::from(&crate_dir).join("fjage.h");
    let config = cbindgen::Config::from_file(PathBuf::from(&crate_dir).join("cbindgen.toml"))?;

    cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()?
        .write_to_file(&header);

    for source in ["lib.rs", "aid.rs", "error.rs", "logging.rs", "message.rs", "param.rs"] {
        println!("cargo:rerun-if-changed=src/{source}");
    }
    println!("cargo:rerun-if-changed=cbindgen.toml");

    Ok(())
}
