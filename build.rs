fn main() {
    // ESP-IDF toolchain environment is only needed for on-target builds.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
