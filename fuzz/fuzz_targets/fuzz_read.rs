#![no_main]
use libfuzzer_sys::fuzz_target;
use relicfs::{Image, ImageConfig, OpenFlags};

// Streaming reads and seeks over arbitrary images: errors are fine,
// panics and hangs are not.
fuzz_target!(|data: &[u8]| {
    let Ok(fs) = Image::bind(ImageConfig::new().bytes(data)) else {
        return;
    };

    let Ok(dh) = fs.open_dir(None) else { return };
    for entry in dh.take(16) {
        if !entry.is_file() {
            continue;
        }
        for flags in [OpenFlags::empty(), OpenFlags::RAW] {
            let Ok(mut handle) = fs.open(&entry, flags) else {
                continue;
            };
            let mut buf = [0u8; 256];
            let _ = handle.read(&mut buf);
            let _ = handle.seek(std::io::SeekFrom::Start(128));
            let _ = handle.seek(std::io::SeekFrom::Current(-64));
            let _ = handle.read(&mut buf);
            let _ = handle.tell();
        }
    }
});
