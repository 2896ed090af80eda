use telegraph::prelude::*;

/// Draws the voltage profile as a row of characters, one per group of nodes.
fn sketch(voltages: ndarray::ArrayView1<f32>, width: usize) -> String {
    const LEVELS: &[u8] = b"_.-~'^";
    let chunk = (voltages.len() + width - 1) / width;
    voltages
        .exact_chunks(chunk)
        .into_iter()
        .map(|c| {
            let v = c.iter().fold(0.0f32, |a, &v| if v.abs() > a.abs() { v } else { a });
            let level = ((v.clamp(-1.0, 1.0) + 1.0) / 2.0 * (LEVELS.len() - 1) as f32).round();
            LEVELS[level as usize] as char
        })
        .collect()
}

fn main() {
    for id in 1..=4 {
        let config = ScenarioConfig {
            scenario: Scenario::from_id(id).unwrap(),
            ..Default::default()
        };
        let mut simulation = config.build().unwrap();

        let mut peak = 0.0f32;
        for _ in 0..config.frames {
            simulation.advance();
            peak = peak.max(simulation.state().max_abs_voltage());
        }

        println!("-- Scenario {}: {} --", id, config.scenario);
        println!("Z_eff: {:.3}  Δt: {:.4}  peak |V|: {:.3}",
            simulation.sim_params().impedance,
            simulation.sim_params().delta_t,
            peak,
        );
        println!("{}\n", sketch(simulation.state().voltages.view(), 67));
    }
}
