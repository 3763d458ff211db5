fn main() {
    println!("cargo:rerun-if-env-changed=INTERLOCK_CONFIG_JSON");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
