fn main() {
    patternflow_lib::run()
}
