
#[macro_use]
extern crate tracing;

use city::{
    logging::init_logging,
    settings::SETTINGS_FILE_NAME,
    GameMap,
    Settings,
    DirStyleSource,
};
use city_data::MAP_DIMENSIONS;
use std::{
    env::args,
    path::Path,
    process::ExitCode,
};
use anyhow::{Result, bail};
use vek::*;


const CLI_INTRO: &'static str = r#"City map inspector.

Loads a map file with its style, and reports what is in it."#;

const CLI_HELP: &'static str = r#"
Examples:

    [this command] NYC.CMP
    Load gamedata/NYC.CMP and print its statistics.

    [this command] --data=/games/city SANB.CMP
    Resolve map and style files against another directory.

    [this command] --log=log NYC.CMP
    Also write the log to a file.

Settings are read from settings.json in the working directory, if present.

Env var examples:
    RUST_LOG=cmp_format=trace
    Changes logging levels"#;


fn main() -> ExitCode {
    println!("{}", CLI_INTRO);
    let args = args().collect::<Vec<_>>();
    if args.get(1).map(String::as_str) == Some("--help") {
        println!("{}", CLI_HELP);
        return ExitCode::SUCCESS;
    }

    let log_file = args.iter()
        .filter_map(|arg| arg.strip_prefix("--log="))
        .next();
    if let Err(e) = init_logging(log_file.map(Path::new)) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    match run_from_cli(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

// parse CLI args and inspect the map named by them
fn run_from_cli(args: &[String]) -> Result<()> {
    let mut settings = Settings::read(SETTINGS_FILE_NAME);
    if let Some(data_dir) = args.iter().filter_map(|arg| arg.strip_prefix("--data=")).next() {
        settings.data_dir = data_dir.into();
    }
    let map_name = match args.iter().skip(1).find(|arg| !arg.starts_with("--")) {
        Some(map_name) => map_name,
        None => bail!("no map file given, see --help"),
    };
    inspect_map(&settings, map_name)
}

// load a map and log what it contains
fn inspect_map(settings: &Settings, map_name: &str) -> Result<()> {
    let mut styles = DirStyleSource::new(&settings.data_dir, settings.style_format);
    let mut map = GameMap::with_settings(settings);
    map.load_from_file(settings.data_dir.join(map_name), &mut styles)?;

    info!("{} non-empty blocks", map.grid().count_non_empty());
    info!("{} startup objects, {} of them cars",
        map.startup_objects().len(),
        map.startup_objects().iter().filter(|object| object.is_car()).count(),
    );
    let bases = map.service_bases();
    info!("{} police, {} hospital, {} fire bases",
        bases.police.len(),
        bases.hospital.len(),
        bases.fire.len(),
    );

    if let Some(builder) = map.mesh_builder() {
        let builder = builder.with_reserve(settings.mesh_vertex_reserve, settings.mesh_index_reserve);
        let area = Rect::new(0, 0, MAP_DIMENSIONS as i32, MAP_DIMENSIONS as i32);
        let mesh = builder.build_all_layers(area);
        info!("whole map mesh: {} vertices, {} triangles",
            mesh.vertices.len(),
            mesh.num_triangles(),
        );
    }

    for district in map.districts() {
        println!(
            "{:>3} {:>3} {:>3}x{:<3} sample {:>2}  {}",
            district.x,
            district.y,
            district.w,
            district.h,
            district.sample_index,
            district.name,
        );
    }
    Ok(())
}
