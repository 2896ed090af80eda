use telegraph::prelude::*;
use telegraph::fdtd::*;
use telegraph::{resolve, BaseConstants};

fn main() {
    let npoints = 200;
    let base = BaseConstants {
        inductance: 1.0, // [H / m]
        capacitance: 0.01, // [F / m]
        angular_frequency: 0.2, // [rad / s]
        stability_margin: 0.9,
    };
    let scenario = Scenario::ShortCircuit;
    let sim_params = resolve(&scenario, &base);

    // a lossless line shorted at the far end
    let mut simulation = Simulation::new(SimulationDescriptor {
        solver: FdtdSolver::new(FdtdSolverDescriptor {
            tline: components::LinearLine::new(npoints).unwrap(),
            source: Box::new(components::HarmonicVSource {
                amplitude: 0.5,
                angular_frequency: base.angular_frequency,
            }),
            terminator: Box::new(components::ResistiveTerminator),
        }),
        sim_params,
        sub_steps: 5,
        phase_mode: PhaseMode::FrameLocked,
        init_state: None,
    }).unwrap();

    println!(
        "\n-- General Simulation Info --\n\
        # of segments: {}\n\
        Z:             {:<9.2} Ω\n\
        Δt:            {:<9.2e} s\n",
        npoints,
        sim_params.impedance,
        sim_params.delta_t,
    );

    println!("-- Run Part 1 --");
    // let the standing wave build up and save end data
    simulation.run(RunDescriptor {
        frames: 1000,
        verbose: true,
        halt_on_divergence: true,
        frame_interval: None,
        save_settings: Some(SaveSettings {
            filename: "data/standing_wave.h5",
            save_type: SaveType::End,
            overwrite: true,
        }),
    })
    .unwrap();

    println!("-- Run Part 2 --");
    // save full data once settled
    simulation.run(RunDescriptor {
        frames: 1000,
        verbose: true,
        halt_on_divergence: true,
        frame_interval: None,
        save_settings: Some(SaveSettings {
            filename: "data/standing_wave.h5",
            save_type: SaveType::Full,
            overwrite: false,
        }),
    })
    .unwrap();
}
