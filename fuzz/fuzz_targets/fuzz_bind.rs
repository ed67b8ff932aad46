#![no_main]
use libfuzzer_sys::fuzz_target;
use relicfs::{Image, ImageConfig};

// Arbitrary bytes must never panic the binder or the resolver.
fuzz_target!(|data: &[u8]| {
    let Ok(fs) = Image::bind(ImageConfig::new().bytes(data)) else {
        return;
    };

    let _ = fs.resolve("");
    let _ = fs.resolve("index.html");
    let _ = fs.resolve("a/b/c");
    let _ = fs.full_path(&fs.root());

    if let Ok(dh) = fs.open_dir(None) {
        for entry in dh.take(64) {
            let _ = fs.stat(&entry);
            let _ = fs.full_path(&entry);
        }
    }
});
