use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use worldmap::{
    ArtifactPaths, BuildConfig, InputPaths, RandomSource, RawData, RenderOptions, SeedRecord,
    World, build_world, read_artifacts, render_png, render_svg, write_artifacts,
};

/// Генератор карты мира: континенты, локации, дороги и врата
#[derive(Parser, Debug)]
#[command(name = "worldmap", author, version, about, long_about = None)]
struct Cli {
    /// Подробный лог (уровень debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Напечатать затраченное время
    #[arg(long, global = true)]
    time: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Построить мир и записать артефакты
    Generate(GenerateArgs),
    /// Первые значения генератора для заданного сида
    Prng {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
    /// Прочитать артефакты и проверить инварианты графа
    Verify {
        #[command(flatten)]
        outputs: OutputArgs,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    #[arg(long, default_value = "continents.json")]
    continent_data: PathBuf,
    #[arg(long, default_value = "locations.json")]
    location_data: PathBuf,
    #[arg(long, default_value = "gates.json")]
    gate_data: PathBuf,
    #[arg(long, default_value = "roads.json")]
    road_data: PathBuf,
    #[arg(long, default_value = "randseed.json")]
    seed_data: PathBuf,
}

impl OutputArgs {
    fn paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            continents: self.continent_data.clone(),
            locations: self.location_data.clone(),
            gates: self.gate_data.clone(),
            roads: self.road_data.clone(),
            seed: self.seed_data.clone(),
        }
    }
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(long, default_value = "worldmap.txt")]
    map_data: PathBuf,
    #[arg(long, default_value = "cities.json")]
    city_data: PathBuf,
    #[arg(long, default_value = "lands.json")]
    land_data: PathBuf,
    #[arg(long, default_value = "regions.json")]
    region_data: PathBuf,

    #[command(flatten)]
    outputs: OutputArgs,

    /// Конфигурация построения в формате TOML
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Сид генератора (перекрывает значение из конфигурации)
    #[arg(long)]
    seed: Option<u64>,

    /// Восстановить генератор из записи сида прошлого запуска
    #[arg(long, conflicts_with = "seed")]
    restore_seed: Option<PathBuf>,

    /// Компактный JSON вместо форматированного
    #[arg(long)]
    compact: bool,

    #[arg(long)]
    no_color: bool,
    #[arg(long)]
    no_scale: bool,
    #[arg(long)]
    create_png: bool,
    #[arg(long)]
    create_svg: bool,
    #[arg(long, default_value = "worldmap.png")]
    png_file: PathBuf,
    #[arg(long, default_value = "worldmap.svg")]
    svg_file: PathBuf,

    /// Ограничение времени рендера в миллисекундах
    #[arg(long)]
    render_timeout_ms: Option<u64>,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let started = Instant::now();
    let code = match cli.command {
        Commands::Generate(args) => generate(&args)?,
        Commands::Prng { seed, count } => {
            let mut rng = RandomSource::new(seed);
            for _ in 0..count {
                println!("{}", rng.next());
            }
            ExitCode::SUCCESS
        }
        Commands::Verify { outputs } => verify(&outputs.paths())?,
    };

    if cli.time {
        println!("Время: {:.3} с", started.elapsed().as_secs_f64());
    }
    Ok(code)
}

fn load_config(args: &GenerateArgs) -> anyhow::Result<BuildConfig> {
    let mut config = match &args.config {
        Some(path) => BuildConfig::from_toml_file(path)
            .with_context(|| format!("не удалось прочитать конфигурацию {}", path.display()))?,
        None => BuildConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.no_color {
        config.render.color = false;
    }
    if args.no_scale {
        config.render.scale = false;
    }
    Ok(config)
}

fn generate(args: &GenerateArgs) -> anyhow::Result<ExitCode> {
    let config = load_config(args)?;

    let rng = match &args.restore_seed {
        Some(path) => {
            let record = SeedRecord::read_from(path)
                .with_context(|| format!("не удалось прочитать сид {}", path.display()))?;
            RandomSource::restore(&record)?
        }
        None => RandomSource::new(config.seed),
    };

    println!("Загрузка входных данных...");
    let inputs = InputPaths {
        map: args.map_data.clone(),
        cities: args.city_data.clone(),
        lands: args.land_data.clone(),
        regions: args.region_data.clone(),
    };
    let data = RawData::load(&inputs).context("входные данные отклонены")?;

    println!(
        "Построение мира ({}×{})...",
        data.grid.cols, data.grid.rows
    );
    let world = build_world(&data, &config, rng);

    write_artifacts(&world, &args.outputs.paths(), !args.compact)
        .context("не удалось записать артефакты")?;

    let summary = world.summary();
    println!(
        "Континентов: {}, локаций: {}, дорог: {}, врат: {}",
        summary.continents, summary.locations, summary.roads, summary.gates
    );
    if summary.discarded_components > 0 {
        println!(
            "Отброшено мелких массивов суши: {} ({} клеток)",
            summary.discarded_components, summary.discarded_cells
        );
    }
    if summary.warnings() > 0 {
        println!(
            "Предупреждения: не размещено локаций {}, не хватило врат {}",
            summary.placement_shortfall, summary.gate_shortfall
        );
    }

    let mut options = RenderOptions::from(&config.render);
    if let Some(ms) = args.render_timeout_ms {
        options = options.with_timeout(Duration::from_millis(ms));
    }

    let mut code = ExitCode::SUCCESS;
    if args.create_png && !render(&world, &options, &args.png_file, render_png) {
        code = ExitCode::from(2);
    }
    if args.create_svg && !render(&world, &options, &args.svg_file, render_svg) {
        code = ExitCode::from(2);
    }
    Ok(code)
}

/// Ошибка рендера не отменяет уже записанные артефакты
fn render(
    world: &World,
    options: &RenderOptions,
    path: &Path,
    draw: fn(&World, &RenderOptions, &Path) -> worldmap::Result<()>,
) -> bool {
    println!("Рендер {}...", path.display());
    match draw(world, options, path) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("Рендер {} не удался: {e}", path.display());
            false
        }
    }
}

fn verify(paths: &ArtifactPaths) -> anyhow::Result<ExitCode> {
    let data = read_artifacts(paths).context("не удалось прочитать артефакты")?;
    let issues = data.verify();
    if issues.is_empty() {
        println!(
            "OK: континентов {}, локаций {}, дорог {}, врат {}",
            data.continents.len(),
            data.locations.len(),
            data.roads.len(),
            data.gates.len()
        );
        return Ok(ExitCode::SUCCESS);
    }
    for issue in &issues {
        println!("  - {issue}");
    }
    anyhow::bail!("найдено нарушений: {}", issues.len())
}
