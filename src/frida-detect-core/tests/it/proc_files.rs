//! ProbeSet tests against synthetic `/proc` files.

use std::path::Path;

use frida_detect_core::{Detection, ProbeConfig, ProbeKind, ProbeSet, RegionCondition};

fn probes_in(dir: &Path) -> ProbeSet {
    ProbeSet::new(ProbeConfig {
        maps_path: dir.join("maps"),
        tcp_table_path: dir.join("tcp"),
        status_path: dir.join("status"),
        hook_library: "libdefinitely-not-here.so".into(),
        artifact_paths: vec![
            dir.join("frida-server"),
            dir.join("frida-gadget.so"),
            dir.join("re.frida.server"),
        ],
        ..ProbeConfig::default()
    })
}

const CLEAN_MAPS: &str = "\
5a00000000-5a00001000 r--p 00000000 fd:01 1001   /system/bin/app_process64
7f00000000-7f00010000 r-xp 00000000 fd:01 1002   /apex/com.android.runtime/lib64/bionic/libc.so
7f00010000-7f00020000 rw-p 00000000 00:00 0      [anon:libc_malloc]
7ffff0000-7ffff1000 rw-p 00000000 00:00 0        [stack]
";

const CLEAN_TCP: &str = "\
  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 0100007F:13AD 00000000:0000 0A 00000000:00000000 00:00000000 00000000 10123        0 51234 1 0000000000000000 100 0 0 10 0
   1: 0F02000A:C350 8E5ACB4A:01BB 01 00000000:00000000 00:00000000 00000000 10123        0 51299 1 0000000000000000 20 4 30 10 -1
";

#[test]
fn clean_device_reports_nothing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("maps"), CLEAN_MAPS).unwrap();
    std::fs::write(dir.path().join("tcp"), CLEAN_TCP).unwrap();
    std::fs::write(dir.path().join("status"), "Name:\tbaro\nTracerPid:\t0\n").unwrap();

    let probes = probes_in(dir.path());
    assert!(!probes.run_all().any());
    assert!(probes.quick_check().is_none());
}

#[test]
fn frida_server_listener_detected() {
    let dir = tempfile::tempdir().unwrap();
    let table = format!(
        "{CLEAN_TCP}   2: 0100007F:6A6A 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 60001 1 0000000000000000 100 0 0 10 0\n"
    );
    std::fs::write(dir.path().join("tcp"), table).unwrap();

    let probes = probes_in(dir.path());
    assert!(probes.check_server_port());
    assert_eq!(probes.quick_check(), Some(Detection::ServerPort));
}

#[test]
fn rwx_anon_sample_line_detected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("maps"),
        "7f0000000000-7f0000001000 rwxp 00000000 00:00 0 [anon:test]\n",
    )
    .unwrap();

    let probes = probes_in(dir.path());
    assert!(probes.scan_suspicious_memory());
    let finding = probes.find_suspicious_region().unwrap();
    assert_eq!(finding.condition, RegionCondition::RwxAnonymous);
}

#[test]
fn frida_server_mapping_detected() {
    let dir = tempfile::tempdir().unwrap();
    let maps = format!(
        "{CLEAN_MAPS}7f40000000-7f40100000 r--p 00000000 fd:20 777   /data/local/tmp/re.frida.server/frida-agent-64.so\n"
    );
    std::fs::write(dir.path().join("maps"), maps).unwrap();

    let probes = probes_in(dir.path());
    let finding = probes.find_suspicious_region().unwrap();
    assert_eq!(finding.condition, RegionCondition::AgentLibrary);
    assert_eq!(finding.line_number, 5);

    let decisive = ProbeSet::new(ProbeConfig {
        memory_scan_decisive: true,
        ..probes.config().clone()
    });
    let detection = decisive.quick_check().unwrap();
    assert_eq!(detection.to_string(), "Frida gadget library is loaded");
}

#[test]
fn empty_sources_are_clean() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["maps", "tcp", "status"] {
        std::fs::write(dir.path().join(name), "").unwrap();
    }

    let probes = probes_in(dir.path());
    for kind in [ProbeKind::MemoryScan, ProbeKind::ServerPort, ProbeKind::Debugger] {
        assert!(!probes.run(kind), "{kind} fired on empty input");
    }
}

#[test]
fn unreadable_sources_are_clean() {
    let dir = tempfile::tempdir().unwrap();
    // Directories cannot be read as files.
    for name in ["maps", "tcp", "status"] {
        std::fs::create_dir(dir.path().join(name)).unwrap();
    }

    let probes = probes_in(dir.path());
    assert!(!probes.scan_suspicious_memory());
    assert!(!probes.check_server_port());
    assert!(!probes.check_debugger());
}

#[test]
fn artifact_file_reported_before_hooks() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("frida-gadget.so"), b"\x7fELF").unwrap();
    std::fs::write(dir.path().join("tcp"), "   0: 0100007F:6A6B 00000000:0000 0A\n").unwrap();

    let probes = probes_in(dir.path());
    match probes.quick_check() {
        Some(Detection::ArtifactFile { path }) => assert!(path.ends_with("frida-gadget.so")),
        other => panic!("unexpected detection: {other:?}"),
    }
}

#[test]
fn probes_run_concurrently() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("maps"), CLEAN_MAPS).unwrap();
    std::fs::write(dir.path().join("tcp"), CLEAN_TCP).unwrap();

    let probes = probes_in(dir.path());
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let probes = &probes;
                s.spawn(move || probes.run(ProbeKind::ALL[i % ProbeKind::ALL.len()]))
            })
            .collect();
        for handle in handles {
            assert!(!handle.join().unwrap());
        }
    });
}

#[test]
fn default_probes_do_not_panic() {
    // Results depend on the host; only the absence of a crash is checked.
    let _ = frida_detect_core::check_frida_trampoline();
    let _ = frida_detect_core::check_frida_server();
    let _ = frida_detect_core::scan_suspicious_memory();
}
