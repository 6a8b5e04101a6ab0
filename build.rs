fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    #[cfg(feature = "sdk")]
    sdk::generate_bindings();
}

#[cfg(feature = "sdk")]
mod sdk {
    use std::env;
    use std::path::PathBuf;

    const DEFAULT_INCLUDE_DIR: &str = "/usr/local/include";
    const DEFAULT_LIB_DIR: &str = "/usr/local/lib";

    const HEADERS: [&str; 3] = [
        "nr_agent_sdk/include/newrelic_collector_client.h",
        "nr_agent_sdk/include/newrelic_common.h",
        "nr_agent_sdk/include/newrelic_transaction.h",
    ];

    pub fn generate_bindings() {
        println!("cargo:rerun-if-env-changed=NEWRELIC_SDK_INCLUDE_DIR");
        println!("cargo:rerun-if-env-changed=NEWRELIC_SDK_LIB_DIR");

        let include_dir = PathBuf::from(
            env::var("NEWRELIC_SDK_INCLUDE_DIR").unwrap_or_else(|_| DEFAULT_INCLUDE_DIR.to_string()),
        );
        let lib_dir = env::var("NEWRELIC_SDK_LIB_DIR").unwrap_or_else(|_| DEFAULT_LIB_DIR.to_string());

        println!("cargo:rustc-link-search=native={}", lib_dir);
        println!("cargo:rustc-link-lib=dylib=newrelic-collector-client");
        println!("cargo:rustc-link-lib=dylib=newrelic-common");
        println!("cargo:rustc-link-lib=dylib=newrelic-transaction");

        let mut builder = bindgen::Builder::default()
            .clang_arg(format!("-I{}", include_dir.display()))
            .allowlist_function("newrelic_.*")
            .allowlist_var("NEWRELIC_.*")
            .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()));

        for header in HEADERS {
            builder = builder.header(include_dir.join(header).to_string_lossy().into_owned());
        }

        let bindings = builder
            .generate()
            .expect("Unable to generate bindings for the New Relic Agent SDK");

        let out_path = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
        bindings
            .write_to_file(out_path.join("bindings.rs"))
            .expect("Couldn't write bindings!");
    }
}
