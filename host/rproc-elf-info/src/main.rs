//! Host tool which shows how an ELF image would be placed by the co-processor boot session.
use std::path::Path;

use clap::Parser as _;
use simple_logger::SimpleLogger;
use sunxi_elf_image::{
    AddressRange, ImageHeader, RemapTable, WindowSink, entry_address, find_section, load, parse,
    plan, segments,
};
use sunxi_rproc_hal::presets::{self, PRESETS};
use sunxi_rproc_hal::target::EntryView;

#[derive(clap::Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Path to the ELF image.
    #[arg(short, long)]
    path: String,
    /// Board preset which selects the target core and its address map.
    #[arg(long, conflicts_with = "remap")]
    preset: Option<String>,
    /// Address range as `v_start:v_end:p_start`, inclusive end. Can be given multiple times.
    #[arg(short, long, value_parser = parse_range)]
    remap: Vec<AddressRange>,
    /// Dump the start of a section, for example `.resource_table`.
    #[arg(short, long)]
    section: Option<String>,
    /// Load the image into a scratch buffer to verify that every segment can be placed.
    #[arg(long)]
    dry_run: bool,
    /// List the available presets and exit.
    #[arg(long)]
    list_presets: bool,
}

fn parse_number(value: &str) -> Result<u64, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => value.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("invalid address {value:?}: {e}"))
}

fn parse_range(value: &str) -> Result<AddressRange, String> {
    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() != 3 {
        return Err(format!("expected v_start:v_end:p_start, got {value:?}"));
    }
    let v_start = parse_number(parts[0])?;
    let v_end = parse_number(parts[1])?;
    if v_end < v_start {
        return Err(format!("range end {v_end:#x} lies before its start {v_start:#x}"));
    }
    Ok(AddressRange::new(v_start, v_end, parse_number(parts[2])?))
}

fn print_header(header: &ImageHeader) {
    println!("class:    {:?}", header.class());
    match header.machine() {
        Some(machine) => println!("machine:  {:?}", machine),
        None => println!("machine:  {:#06x}", header.machine_raw()),
    }
    println!("entry:    {:#010x}", entry_address(header));
    println!(
        "segments: {} at offset {:#x}",
        header.program_header_count(),
        header.program_header_offset()
    );
    println!(
        "sections: {} at offset {:#x}",
        header.section_header_count(),
        header.section_header_offset()
    );
}

fn main() {
    SimpleLogger::new().init().unwrap();
    let cli = Cli::parse();
    if cli.list_presets {
        for preset in PRESETS.iter() {
            println!("{:<12} {:?} core {}", preset.name, preset.target.kind, preset.target.name);
        }
        return;
    }

    let image_path = Path::new(&cli.path);
    if !image_path.exists() {
        log::error!("File not found: {}", image_path.display());
        std::process::exit(1);
    }
    let image = std::fs::read(image_path).expect("failed to read image file");
    let header = match parse(&image) {
        Ok(header) => header,
        Err(e) => {
            log::error!("{}: {}", image_path.display(), e);
            std::process::exit(1);
        }
    };

    let preset = cli.preset.as_deref().map(|name| {
        presets::find(name).unwrap_or_else(|| {
            log::error!("Unknown preset {name:?}, use --list-presets");
            std::process::exit(1);
        })
    });
    let table = match preset {
        Some(preset) => preset.remap_table(),
        None => RemapTable::new(&cli.remap),
    };

    print_header(&header);
    if let Some(preset) = preset
        && let Some(expected) = preset.target.machine
        && header.machine() != Some(expected)
    {
        log::warn!(
            "image machine {:#06x} does not match the {:?} core of preset {}",
            header.machine_raw(),
            expected,
            preset.name
        );
    }

    println!("--------------------------------------");
    let segment_iter = segments(&image, &header).expect("failed to read program headers");
    for segment in segment_iter {
        println!(
            "[{:>2}] type {:#010x} flags {}{}{} paddr {:#010x} vaddr {:#010x} file {:#x} mem {:#x}",
            segment.index,
            segment.segment_type,
            if segment.flags.read() { 'r' } else { '-' },
            if segment.flags.write() { 'w' } else { '-' },
            if segment.flags.execute() { 'x' } else { '-' },
            segment.phys_addr,
            segment.virt_addr,
            segment.file_size,
            segment.mem_size
        );
    }

    println!("--------------------------------------");
    let load_plan = match plan(&image, &header, &table) {
        Ok(load_plan) => load_plan,
        Err(e) => {
            log::error!("image can not be loaded: {}", e);
            std::process::exit(1);
        }
    };
    for op in load_plan {
        println!(
            "segment {} {:#010x} -> {:#010x}: copy {:#x}, zero {:#x}",
            op.segment_index,
            op.declared_addr,
            op.destination,
            op.file_size(),
            op.zero_fill
        );
    }
    let declared_entry = entry_address(&header);
    let entry = match preset.map(|preset| preset.target.entry_view) {
        Some(EntryView::Physical) => table.translate(declared_entry),
        _ => declared_entry,
    };
    println!("boot vector: {:#010x}", entry);

    if cli.dry_run {
        dry_run(&image, &header, &table);
    }

    if let Some(name) = cli.section {
        match find_section(&image, &header, &name) {
            Ok(Some(section)) => {
                println!("--------------------------------------");
                println!(
                    "section {} at {:#010x}, size {:#x}",
                    name, section.addr, section.size
                );
                match section.data(&image) {
                    Some(data) => {
                        for (idx, line) in data.chunks(16).take(8).enumerate() {
                            print!("{:08x}:", idx * 16);
                            for byte in line {
                                print!(" {:02x}", byte);
                            }
                            println!();
                        }
                    }
                    None => log::warn!("section {} has no contents in the file", name),
                }
            }
            Ok(None) => log::warn!("no section called {}", name),
            Err(e) => {
                log::error!("failed to read section table: {}", e);
                std::process::exit(1);
            }
        }
    }
}

/// Load into one scratch buffer which spans all destinations of the plan.
fn dry_run(image: &[u8], header: &ImageHeader, table: &RemapTable<'_>) {
    let Ok(load_plan) = plan(image, header, table) else {
        return;
    };
    let mut window: Option<(u64, u64)> = None;
    for op in load_plan {
        let end = op.destination.saturating_add(op.mem_size());
        window = Some(match window {
            Some((start, stop)) => (start.min(op.destination), stop.max(end)),
            None => (op.destination, end),
        });
    }
    let Some((start, end)) = window else {
        println!("dry run: nothing to load");
        return;
    };
    const MAX_SCRATCH: u64 = 256 * 1024 * 1024;
    if end - start > MAX_SCRATCH {
        log::warn!(
            "dry run skipped, destinations span {:#x} bytes",
            end - start
        );
        return;
    }
    let mut scratch = vec![0u8; (end - start) as usize];
    match load(image, header, table, WindowSink::new(start, &mut scratch)) {
        Ok(summary) => println!(
            "dry run: {} segments, {} bytes copied, {} bytes zeroed",
            summary.segments_loaded, summary.bytes_copied, summary.bytes_zeroed
        ),
        Err(e) => {
            log::error!("dry run failed: {}", e);
            std::process::exit(1);
        }
    }
}
