//! eBPF program loader
//!
//! Handles loading the eBPF program, attaching the block tracepoints, and
//! handing out the shared maps.

use crate::types::IssueQueue;
use anyhow::{Context, Result};
use aya::{
    maps::{Array, HashMap as AyaHashMap, MapData},
    programs::BtfTracePoint,
    Bpf, BpfLoader, Btf,
};
use aya_log::BpfLogger;
use iolatency_common::{
    ISSUE_TIME_MAP, LATENCY_HIST, PROG_RQ_COMPLETE, PROG_RQ_ISSUE, REQUEST_TAG_OFFSET_SYMBOL,
};
use log::{info, warn};
use std::path::PathBuf;

/// eBPF program loader and manager
pub struct ProbeLoader {
    ebpf: Bpf,
}

impl ProbeLoader {
    /// Load eBPF program from file or embedded bytecode
    ///
    /// # Arguments
    ///
    /// * `path` - Optional path to eBPF object file. If None, uses embedded bytecode.
    /// * `tag_offset` - Byte offset of `tag` in `struct request` for this kernel
    ///
    /// # Returns
    ///
    /// ProbeLoader instance with loaded eBPF program
    pub fn load(path: Option<PathBuf>, tag_offset: u32) -> Result<Self> {
        info!("Loading eBPF program...");

        let data = if let Some(obj_path) = path {
            info!("Loading eBPF object from: {:?}", obj_path);
            std::fs::read(&obj_path)
                .with_context(|| format!("Failed to read eBPF object file: {:?}", obj_path))?
        } else {
            #[cfg(feature = "embedded")]
            {
                info!("Loading embedded eBPF program...");
                include_bytes!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/../kernel/target/bpfel-unknown-none/release/iolatency"
                ))
                .to_vec()
            }
            #[cfg(not(feature = "embedded"))]
            {
                anyhow::bail!(
                    "No eBPF object file provided. Use --ebpf-object or compile with 'embedded' feature"
                );
            }
        };

        info!("  request tag offset: {} bytes", tag_offset);
        let ebpf = BpfLoader::new()
            .set_global(REQUEST_TAG_OFFSET_SYMBOL, &tag_offset, true)
            .load(&data)
            .context("Failed to load eBPF program")?;

        info!("eBPF program loaded successfully");

        Ok(Self { ebpf })
    }

    /// Initialize eBPF logger
    ///
    /// Forwards kernel-side log records to the `log` facade.
    /// Non-fatal if it fails.
    pub fn init_logger(&mut self) {
        if let Err(e) = BpfLogger::init(&mut self.ebpf) {
            warn!("eBPF logger not available - logging from eBPF program will not be captured: {}", e);
        }
    }

    /// Attach the block tracepoints
    ///
    /// Attaches to:
    /// - block:block_rq_issue
    /// - block:block_rq_complete
    ///
    /// # Returns
    ///
    /// Result indicating success or failure
    pub fn attach_tracepoints(&mut self) -> Result<()> {
        info!("Attaching block tracepoints...");

        let btf = Btf::from_sys_fs().context("Failed to read kernel BTF from /sys/kernel/btf")?;

        for name in [PROG_RQ_ISSUE, PROG_RQ_COMPLETE] {
            let program: &mut BtfTracePoint = self
                .ebpf
                .program_mut(name)
                .with_context(|| format!("{} program not found in eBPF object", name))?
                .try_into()
                .with_context(|| format!("Failed to get {} as BtfTracePoint", name))?;
            program
                .load(name, &btf)
                .with_context(|| format!("Failed to load {}", name))?;
            program
                .attach()
                .with_context(|| format!("Failed to attach block:{} tracepoint", name))?;
            info!("  ✓ Attached to block:{}", name);
        }

        info!("All tracepoints attached successfully");

        Ok(())
    }

    /// Get the latency histogram array
    ///
    /// # Returns
    ///
    /// Array of per-bucket completion counters
    pub fn histogram(&mut self) -> Result<Array<MapData, u32>> {
        let map = self
            .ebpf
            .take_map(LATENCY_HIST)
            .with_context(|| format!("{} map not found in eBPF object", LATENCY_HIST))?;

        Array::try_from(map)
            .with_context(|| format!("Failed to create Array from {} map", LATENCY_HIST))
    }

    /// Get the tag -> issue queue table
    ///
    /// # Returns
    ///
    /// Read-only view of the issue table for diagnostics
    pub fn issue_table(&mut self) -> Result<AyaHashMap<MapData, u32, IssueQueue>> {
        let map = self
            .ebpf
            .take_map(ISSUE_TIME_MAP)
            .with_context(|| format!("{} map not found in eBPF object", ISSUE_TIME_MAP))?;

        AyaHashMap::try_from(map)
            .with_context(|| format!("Failed to create HashMap from {} map", ISSUE_TIME_MAP))
    }
}
