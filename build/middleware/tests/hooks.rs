// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use build_middleware::hooks::{IsrNoBlock, VendorLibrary};
use build_middleware::{BuildEnv, Flags, HooksConfig, Node, SourceNode};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const WIRING: &str = "\
#include \"wiring_private.h\"

#if defined(TIM0_OVF_vect)
ISR(TIM0_OVF_vect)
#else
ISR(TIMER0_OVF_vect)
#endif
{
\ttimer0_millis += 1;
}

// also referenced as TIMER0_OVF_vect)
";

fn write(root: &Path, rel: &str, text: &str) {
    let p = root.join(rel);
    fs::create_dir_all(p.parent().unwrap()).unwrap();
    fs::write(p, text).unwrap();
}

fn s(v: &[&str]) -> Vec<String> {
    v.iter().map(|x| x.to_string()).collect()
}

#[test]
fn wiring_is_patched_beside_the_original() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "core/wiring.c", WIRING);

    let mut env = BuildEnv::new(Flags::default());
    let isr = IsrNoBlock::default();
    let pattern = isr.pattern.clone();
    env.add_build_middleware(&pattern, isr).unwrap();

    let src = dir.path().join("core/wiring.c");
    let obj = env.process(SourceNode::new(&src)).unwrap().unwrap();
    let patched = dir.path().join("core/wiring-ISR_NOBLOCK.c");
    assert_eq!(obj.node().src(), patched);

    let out = fs::read_to_string(&patched).unwrap();
    assert_eq!(out.matches("TIMER0_OVF_vect, ISR_NOBLOCK)").count(), 2);
    assert_eq!(
        out,
        WIRING.replace("TIMER0_OVF_vect", "TIMER0_OVF_vect, ISR_NOBLOCK")
    );
    // TIM0_OVF_vect isn't the token.
    assert!(out.contains("ISR(TIM0_OVF_vect)\n"));
    // Original untouched.
    assert_eq!(fs::read_to_string(&src).unwrap(), WIRING);
}

#[test]
fn patching_is_idempotent() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "wiring.c", WIRING);
    let node = SourceNode::new(dir.path().join("wiring.c"));
    let isr = IsrNoBlock::default();

    let first = isr.apply(&node).unwrap();
    let a = fs::read(first.src()).unwrap();
    let second = isr.apply(&node).unwrap();
    let b = fs::read(second.src()).unwrap();
    assert_eq!(first, second);
    assert_eq!(a, b);
}

#[test]
fn no_token_means_identical_copy() {
    let dir = TempDir::new().unwrap();
    let text = "int x;\r\nvoid f(void) {}\nno newline at end";
    write(dir.path(), "wiring.c", text);
    let out = IsrNoBlock::default()
        .apply(&SourceNode::new(dir.path().join("wiring.c")))
        .unwrap();
    assert_eq!(fs::read_to_string(out.src()).unwrap(), text);
}

#[test]
fn patched_copy_goes_to_the_build_dir() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "core/wiring.c", WIRING);
    let build = dir.path().join("build/FrameworkArduino");
    let node = SourceNode::with_build_path(
        dir.path().join("core/wiring.c"),
        build.join("wiring.c"),
    );
    let out = IsrNoBlock::default().apply(&node).unwrap();
    assert_eq!(out.src(), build.join("wiring-ISR_NOBLOCK.c"));
    assert!(out.src().is_file());
}

#[test]
fn isr_keeps_object_flags() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "wiring.c", WIRING);
    let env = BuildEnv::new(Flags::default());
    let flags = Flags {
        cflags: s(&["-Os"]),
        ..Flags::default()
    };
    let obj = SourceNode::new(dir.path().join("wiring.c")).derive(flags.clone());

    use build_middleware::Middleware;
    let out = IsrNoBlock::default().call(&env, obj.into()).unwrap();
    match out {
        Some(Node::Object(o)) => {
            assert_eq!(o.flags(), &flags);
            assert!(o.node().src().ends_with("wiring-ISR_NOBLOCK.c"));
        }
        other => panic!("expected object, got {:?}", other),
    }
}

#[test]
fn whole_project_plan() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "src/main.cpp", "int main() {}\n");
    write(root, "src/wiring.c", WIRING);
    write(root, "include/usbconfig.h", "#define USB_CFG_IOPORTNAME D\n");
    write(root, "lib/v-usb/usbdrv/usbdrv.c", "#include \"usbconfig.h\"\n");
    write(root, "lib/v-usb/usbdrv/usbdrv.h", "\n");
    write(root, "lib/v-usb/usbdrv/usbdrvasm.S", "\n");
    write(root, "lib/v-usb/usbdrv/usbdrvasm.asm", "; IAR only\n");
    write(root, "lib/v-usb/usbdrv/Readme.txt", "\n");

    let config: HooksConfig = toml::from_str(
        r#"
[flags]
cflags = ["-O2"]
cxxflags = ["-fno-exceptions"]

[isr-noblock]

[[vendor-lib]]
dir = "lib/v-usb"
include-self = true
"#,
    )
    .unwrap();
    let env = config.build_env().unwrap();
    let project = config.project(root).unwrap();

    let plan = project.plan(&env).unwrap();
    assert_eq!(plan.skipped, vec![root.join("lib/v-usb/usbdrv/usbdrvasm.asm")]);
    assert!(plan.is_skipped(&root.join("lib/v-usb/usbdrv/usbdrvasm.asm")));
    assert_eq!(plan.units.len(), 4);
    assert!(plan
        .units
        .iter()
        .all(|u| u.compiled.extension().unwrap() != "asm"));

    let usbdrv = plan.unit(&root.join("lib/v-usb/usbdrv/usbdrv.c")).unwrap();
    assert_eq!(usbdrv.flags, s(&["-O2", "-Iinclude", "-Ilib/v-usb"]));

    let asm = plan.unit(&root.join("lib/v-usb/usbdrv/usbdrvasm.S")).unwrap();
    assert_eq!(asm.flags, s(&["-Iinclude", "-Ilib/v-usb"]));

    let main = plan.unit(&root.join("src/main.cpp")).unwrap();
    assert_eq!(main.flags, s(&["-fno-exceptions"]));

    let wiring = plan.unit(&root.join("src/wiring.c")).unwrap();
    assert_eq!(wiring.compiled, root.join("src/wiring-ISR_NOBLOCK.c"));
    assert_eq!(wiring.flags, s(&["-O2"]));

    // A second run doesn't pick up the copy written by the first.
    let again = project.plan(&env).unwrap();
    assert_eq!(again.units.len(), 4);

    let json = serde_json::to_value(&again).unwrap();
    assert_eq!(json["units"].as_array().unwrap().len(), 4);
    assert_eq!(json["skipped"].as_array().unwrap().len(), 1);
}

#[test]
fn library_spellings_are_independent() {
    let mut env = BuildEnv::new(Flags {
        cflags: s(&["-O2"]),
        ..Flags::default()
    });
    VendorLibrary::new("lib/v-usb").register(&mut env).unwrap();
    VendorLibrary::new("lib/vusb").register(&mut env).unwrap();

    for p in ["/p/lib/v-usb/usbdrv/usbdrvasm.asm", "/p/lib/vusb/usbdrvasm.asm"] {
        assert!(env.process(SourceNode::new(p)).unwrap().is_none(), "{}", p);
    }
    let o = env
        .process(SourceNode::new("/p/lib/vusb/usbdrv.h"))
        .unwrap()
        .unwrap();
    assert_eq!(o.flags().cflags, s(&["-O2", "-Iinclude"]));
}

#[test]
fn empty_plan_compiles_to_nothing() {
    let dir = TempDir::new().unwrap();
    let toolchain = build_middleware::Toolchain {
        compiler: "avr-gcc".into(),
        target: "avr-unknown-gnu-atmega328".into(),
        opt_level: "s".into(),
        out_dir: dir.path().join("obj"),
    };
    let objs = build_middleware::BuildPlan::default()
        .compile(&toolchain)
        .unwrap();
    assert!(objs.is_empty());
    assert!(dir.path().join("obj").is_dir());
}

#[test]
fn non_utf8_source_is_patched_bytewise() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("wiring.c");
    let text: &[u8] = b"/* \xa9 Arduino */\nISR(TIMER0_OVF_vect)\n\xff\xfe\r\n";
    fs::write(&src, text).unwrap();

    let out = IsrNoBlock::default().apply(&SourceNode::new(&src)).unwrap();
    assert_eq!(
        fs::read(out.src()).unwrap(),
        b"/* \xa9 Arduino */\nISR(TIMER0_OVF_vect, ISR_NOBLOCK)\n\xff\xfe\r\n".to_vec()
    );
    assert_eq!(fs::read(&src).unwrap(), text);
}

#[test]
fn empty_suffix_never_truncates_the_source() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "core/wiring.c", WIRING);
    let config: HooksConfig =
        toml::from_str("[isr-noblock]\nsuffix = \"\"\n").unwrap();
    let env = config.build_env().unwrap();

    let src = dir.path().join("core/wiring.c");
    assert!(env.process(SourceNode::new(&src)).is_err());
    assert_eq!(fs::read_to_string(&src).unwrap(), WIRING);
}

#[test]
fn relative_paths_match_vendor_patterns() {
    let mut env = BuildEnv::new(Flags {
        cflags: s(&["-O2"]),
        ..Flags::default()
    });
    VendorLibrary::new("lib/v-usb").register(&mut env).unwrap();
    assert!(env
        .process(SourceNode::new("lib/v-usb/usbdrv/usbdrvasm.asm"))
        .unwrap()
        .is_none());
    let o = env
        .process(SourceNode::new("lib/v-usb/usbdrv/usbdrv.h"))
        .unwrap()
        .unwrap();
    assert_eq!(o.flags().cflags, s(&["-O2", "-Iinclude"]));

    let mut env = BuildEnv::new(Flags {
        cflags: s(&["-O2"]),
        ..Flags::default()
    });
    let lib = VendorLibrary {
        include_self: true,
        ..VendorLibrary::new("lib/v-usb")
    };
    lib.register(&mut env).unwrap();
    let o = env
        .process(SourceNode::new("lib/v-usb/usbdrv/usbdrv.h"))
        .unwrap()
        .unwrap();
    assert_eq!(o.flags().cflags, s(&["-O2", "-Iinclude", "-Ilib/v-usb"]));
}

#[test]
fn same_library_twice_accumulates_includes() {
    let mut env = BuildEnv::new(Flags {
        cflags: s(&["-O2"]),
        ..Flags::default()
    });
    VendorLibrary::new("lib/v-usb").register(&mut env).unwrap();
    let lib = VendorLibrary {
        includes: s(&["config"]),
        ..VendorLibrary::new("lib/v-usb")
    };
    lib.register(&mut env).unwrap();
    let o = env
        .process(SourceNode::new("/p/lib/v-usb/usbdrv/usbdrv.c"))
        .unwrap()
        .unwrap();
    assert_eq!(o.flags().cflags, s(&["-O2", "-Iinclude", "-Iconfig"]));
}
