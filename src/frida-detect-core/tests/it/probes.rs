//! Property-based tests for the probe heuristics.

use proptest::prelude::*;

use frida_detect_core::security::{classify_region, scan_memory_maps, scan_tcp_table};
use frida_detect_core::types::{is_suspicious_prologue, SUSPICIOUS_OPCODES};
use frida_detect_core::{FunctionPrologueBytes, MemoryRegionLine, ProbeConfig, RegionCondition};

fn port_patterns() -> Vec<String> {
    ProbeConfig::default().port_patterns()
}

fn agent_markers() -> Vec<String> {
    ProbeConfig::default().agent_markers
}

/// Strategy for first bytes outside the denylist.
fn clean_opcode() -> impl Strategy<Value = u8> {
    any::<u8>().prop_filter("denylisted opcode", |b| !SUSPICIOUS_OPCODES.contains(b))
}

/// Strategy for TCP table lines that cannot contain a Frida port pattern.
///
/// Hex digits are drawn without `6` so neither `6A6A` nor `6A6B` can appear.
fn clean_tcp_line() -> impl Strategy<Value = String> {
    (
        0u32..1000,
        "[0-57-9A-F]{8}",
        "[0-57-9A-F]{4}",
        "[0-57-9A-F]{8}",
        "[0-57-9A-F]{4}",
        0u32..100_000,
    )
        .prop_map(|(sl, laddr, lport, raddr, rport, inode)| {
            format!(
                "{sl:4}: {laddr}:{lport} {raddr}:{rport} 0A 00000000:00000000 00:00000000 00000000  1000        0 {inode}"
            )
        })
}

/// Strategy for permission flags.
fn perms() -> impl Strategy<Value = String> {
    ("[r-]", "[w-]", "[x-]", "[ps]").prop_map(|(r, w, x, p)| format!("{r}{w}{x}{p}"))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        max_shrink_iters: 500,
        ..ProptestConfig::default()
    })]

    // ========================================================================
    // Prologue Denylist
    // ========================================================================

    /// A denylisted first byte is always suspicious, whatever follows.
    #[test]
    fn denylisted_first_byte_is_suspicious(
        idx in 0usize..SUSPICIOUS_OPCODES.len(),
        rest in prop::array::uniform3(any::<u8>())
    ) {
        let bytes = [SUSPICIOUS_OPCODES[idx], rest[0], rest[1], rest[2]];
        prop_assert!(is_suspicious_prologue(&bytes));
        prop_assert!(FunctionPrologueBytes(bytes).is_suspicious());
    }

    /// Any other first byte is clean, even if later bytes are denylisted.
    #[test]
    fn other_first_byte_is_clean(first in clean_opcode(), rest in prop::array::uniform3(any::<u8>())) {
        let bytes = [first, rest[0], rest[1], rest[2]];
        prop_assert!(!FunctionPrologueBytes(bytes).is_suspicious());
    }

    // ========================================================================
    // TCP Table
    // ========================================================================

    /// Tables without the port patterns never match.
    #[test]
    fn tcp_table_without_patterns_is_clean(lines in prop::collection::vec(clean_tcp_line(), 0..32)) {
        let table = lines.join("\n");
        prop_assert!(scan_tcp_table(table.as_bytes(), &port_patterns()).is_none());
    }

    /// Inserting a Frida listener anywhere makes the table match.
    #[test]
    fn tcp_table_with_listener_matches(
        lines in prop::collection::vec(clean_tcp_line(), 0..32),
        pos in any::<prop::sample::Index>()
    ) {
        let mut lines = lines;
        let at = pos.index(lines.len() + 1);
        lines.insert(at, "  99: 0100007F:6A6A 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 4242".into());
        let table = lines.join("\n");
        let hit = scan_tcp_table(table.as_bytes(), &port_patterns());
        prop_assert!(hit.is_some_and(|l| l.contains("0100007F:6A6A")));
    }

    // ========================================================================
    // Memory Map
    // ========================================================================

    /// `rwxp` with an anonymous name is always flagged as RWX anonymous.
    #[test]
    fn rwxp_anon_is_flagged(tag in "[a-z_-]{0,16}", addr in 0u64..0xffff_ffff) {
        let raw = format!("{addr:012x}-{:012x} rwxp 00000000 00:00 0 [anon:{tag}]", addr + 0x1000);
        let line = MemoryRegionLine::new(&raw);
        prop_assert_eq!(classify_region(&line, &agent_markers()), Some(RegionCondition::RwxAnonymous));
    }

    /// Agent libraries are flagged regardless of permissions.
    #[test]
    fn agent_library_flagged_for_any_perms(p in perms()) {
        let raw = format!("7f0000000000-7f0000001000 {p} 00000000 fd:01 42 /data/local/tmp/re.frida.server/frida-agent-64.so");
        let finding = scan_memory_maps(raw.as_bytes(), &agent_markers());
        prop_assert!(finding.is_some());
    }

    /// The reported line is the first matching one.
    #[test]
    fn first_match_is_reported(clean in 0usize..20, trailing in 1usize..20) {
        let mut maps = String::new();
        for i in 0..clean {
            maps.push_str(&format!("{:012x}-{:012x} r--p 00000000 fd:01 7 /system/lib64/libc.so\n", i * 0x1000, (i + 1) * 0x1000));
        }
        maps.push_str("7f0000000000-7f0000001000 r-xp 00000000 fd:01 8 /data/app/libgadget.so\n");
        for _ in 0..trailing {
            maps.push_str("7f0000001000-7f0000002000 rwxp 00000000 00:00 0 [anon:jit]\n");
        }
        let finding = scan_memory_maps(maps.as_bytes(), &agent_markers()).unwrap();
        prop_assert_eq!(finding.line_number, clean + 1);
        prop_assert_eq!(finding.condition, RegionCondition::AgentLibrary);
    }
}
