/*++

Licensed under the Apache-2.0 license.

File Name:

    build.rs

Abstract:

    Build script to generate the C header for the host bridge bindings.

--*/

use std::env;

fn main() {
    let crate_dir = env::var("CARGO_MANIFEST_DIR").unwrap();

    cbindgen::Builder::new()
        .with_crate(crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("ZHCI_H")
        .with_pragma_once(true)
        .with_documentation(true)
        .with_parse_deps(false)
        .include_item("zhci_start")
        .include_item("zhci_is_started")
        .include_item("zhci_sc_test")
        .include_item("zhci_irq_offload_hw")
        .generate()
        .expect("Unable to generate bindings")
        .write_to_file("zhci.h");

    println!("cargo:rerun-if-changed=src/lib.rs");
}
