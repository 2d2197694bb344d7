fn main() {
    println!("cargo:rerun-if-changed=components/radiolib_shim");

    // Device identity is baked in at build time (see config::DeviceIdentity).
    for var in ["LW_JOIN_EUI", "LW_DEV_EUI", "LW_NWK_KEY", "LW_APP_KEY"] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
