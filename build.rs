use dotenvy::dotenv;
use std::env::var;

fn main() {
    println!("cargo::rustc-check-cfg=cfg(no_key)");
    println!("cargo:rerun-if-env-changed=OPENAI_KEY");
    dotenv().ok();

    if var("OPENAI_KEY").is_err() {
        println!("cargo:rustc-cfg=no_key");
    }
}
