use std::io::Write;
use std::path::Path;

use csim_lib::cache::Geometry;
use csim_lib::classifier::Counters;
use csim_lib::error::SimulatorError;
use csim_lib::error::SimulatorResult;
use csim_lib::run_wrapper::run_trace;
use csim_lib::trace::fetch_accesses;
use plotters::prelude::*;
use tracing_subscriber::EnvFilter;

const MAX_SET_BITS: u32 = 6;
const ASSOCIATIVITIES: [usize; 4] = [1, 2, 4, 8];
const DEFAULT_BLOCK_BITS: u32 = 4;

/// `sweep-eval <trace file> [block bits]`
fn parse_args(param_tokens: &[String]) -> SimulatorResult<(String, u32)> {
    let trace_path = match param_tokens {
        [_, trace_path] | [_, trace_path, _] => trace_path.clone(),
        _ => {
            return Err(SimulatorError::ConfigError(
                "usage: sweep-eval <trace file> [block bits]".to_string(),
            ))
        }
    };
    let block_bits = match param_tokens.get(2) {
        Some(bits) => bits.parse().map_err(|_| {
            SimulatorError::ConfigError(format!("invalid block bits: {bits}"))
        })?,
        None => DEFAULT_BLOCK_BITS,
    };
    Ok((trace_path, block_bits))
}

fn trace_base_name(trace_path: &str) -> String {
    Path::new(trace_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| trace_path.to_string())
}

fn write_rows<W: Write>(
    writer: &mut csv::Writer<W>,
    rows: &[(Geometry, Counters)],
) -> csv::Result<()> {
    writer.write_record([
        "Sets",
        "Associativity",
        "Block size",
        "Hits",
        "Misses",
        "Evictions",
        "Miss rate",
    ])?;
    for (geometry, counters) in rows {
        writer.write_record([
            geometry.num_sets.to_string(),
            geometry.associativity.to_string(),
            geometry.block_size.to_string(),
            counters.hits.to_string(),
            counters.misses.to_string(),
            counters.evictions.to_string(),
            format!("{:.4}", counters.get_miss_rate()),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let param_tokens: Vec<String> = std::env::args().collect();
    let (trace_path, block_bits) = parse_args(&param_tokens)?;
    let trace_base_name = trace_base_name(&trace_path);

    // Parse once, replay once per geometry
    let accesses = fetch_accesses(&trace_path)?;

    // data[i] holds (set bits, miss rate) for ASSOCIATIVITIES[i]
    let mut data: Vec<Vec<(u32, f64)>> =
        vec![vec![]; ASSOCIATIVITIES.len()];
    let mut rows: Vec<(Geometry, Counters)> = Vec::new();
    let mut y_max: f64 = 0.;
    for (i, associativity) in ASSOCIATIVITIES.iter().enumerate() {
        for set_bits in 0..=MAX_SET_BITS {
            let geometry =
                Geometry::from_bits(set_bits, *associativity, block_bits)?;
            let counters = run_trace(geometry, &accesses)?;
            tracing::info!(%geometry, %counters, "sweep point");
            let miss_rate = counters.get_miss_rate();
            data[i].push((set_bits, miss_rate));
            y_max = y_max.max(miss_rate);
            rows.push((geometry, counters));
        }
    }

    std::fs::create_dir_all("eval")?;

    let csv_path = format!("eval/sweep_eval_{}.csv", trace_base_name);
    let mut writer = csv::Writer::from_path(&csv_path)?;
    write_rows(&mut writer, &rows)?;

    // Plot one line series per associativity
    let plot_title = format!("Miss rate sweep: {}", trace_base_name);
    let svg_path = format!("eval/sweep_eval_{}.svg", trace_base_name);

    let root =
        SVGBackend::new(svg_path.as_str(), (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut ctx = ChartBuilder::on(&root)
        .caption(plot_title.as_str(), ("sans-serif", 40).into_font())
        .margin(5)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(
            0..MAX_SET_BITS as i32,
            0.0..(y_max * 1.1).max(0.01),
        )?;
    ctx.configure_mesh()
        .x_desc("Set index bits")
        .y_desc("Miss rate")
        .draw()?;

    for (i, associativity) in ASSOCIATIVITIES.iter().enumerate() {
        let series = data[i].iter().map(|(x, y)| (*x as i32, *y));
        let label = format!("E = {}", associativity);
        let color = Palette99::pick(i).to_rgba();
        ctx.draw_series(LineSeries::new(series, color))?
            .label(label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color)
            });
    }

    ctx.configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;

    eprintln!("Wrote {} and {}", csv_path, svg_path);
    Ok(())
}
