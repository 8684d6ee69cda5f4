fn main() {
    // Compile the Slint file.
    //
    // The appwindow.slint file and everything it imports is compiled into
    // Rust code that `slint::include_modules!()` pulls in.
    slint_build::compile("../ui/appwindow.slint").expect("Slint build failed");
}
