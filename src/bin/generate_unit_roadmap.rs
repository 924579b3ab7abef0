// Generate a roadmap over the unit box and print it in the persisted
// text format.

use std::env;
use std::io::{self, Write};
use std::process;

use multiset_prm::{
    roadmap_gen_from_id, write_roadmap, PlannerError, PlannerResult, RealVectorSpace, Roadmap,
    RoadmapGen,
};

fn run(dim_arg: &str, gen_type: &str, gen_args: &str) -> PlannerResult<()> {
    let dim: usize = dim_arg
        .parse()
        .map_err(|_| PlannerError::BadArgs(format!("bad dimension `{}`", dim_arg)))?;
    let space = RealVectorSpace::unit(dim, 0.05)?;
    let mut generator = roadmap_gen_from_id(&space, &gen_type.to_lowercase(), gen_args)?;
    let mut g = Roadmap::new();
    generator.generate(&space, &mut g, 1)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_roadmap(&g, &mut out)?;
    out.flush()?;
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        eprintln!("Usage: generate_unit_roadmap <dim> <roadmap-type> '<roadmap-args>'");
        process::exit(1);
    }
    if let Err(e) = run(&args[1], &args[2], &args[3]) {
        eprintln!("generate_unit_roadmap: {}", e);
        process::exit(1);
    }
}
