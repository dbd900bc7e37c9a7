//! Whole-leaf simulations.
//!
//! These tests couple the energy balance, photosynthesis and stomatal conductance on one
//! or several leaves and check that:
//! - the coupled solve converges to a physically plausible state
//! - the dispatch layer handles absent models, time series and collections of objects

use approx::assert_relative_eq;
use is_close::is_close;
use plantbiophys_components::components::{
    Beer, Fvcb, FvcbIter, FvcbRaw, Medlyn, Monteith, MonteithParameters,
};
use plantbiophys_components::model_list::{InitPolicy, ModelList, ModelListBuilder, ProcessModels};
use plantbiophys_components::processes::{
    energy_balance, energy_balance_mut, light_interception_mut, simulate, simulate_mut,
};
use plantbiophys_core::atmosphere::{Atmosphere, MeteoRecord};
use plantbiophys_core::component::Process;
use plantbiophys_core::constants::Constants;
use plantbiophys_core::errors::BiophysError;
use plantbiophys_core::weather::Weather;
use std::collections::BTreeMap;

fn meteo() -> Atmosphere {
    Atmosphere::new(22.0, 0.8333, 101.325, 0.4490995)
}

fn leaf(monteith: Monteith) -> ModelListBuilder {
    let mut builder = ModelList::builder();
    builder
        .with_energy_balance(monteith)
        .with_photosynthesis(Fvcb::default())
        .with_stomatal_conductance(Medlyn::new(0.03, 12.0))
        .with_status([
            ("Rs", 13.747),
            ("sky_fraction", 1.0),
            ("PPFD", 1500.0),
            ("d", 0.03),
        ]);
    builder
}

mod coupled_energy_balance {
    use super::*;

    #[test]
    fn test_reference_leaf() {
        let mut object = leaf(Monteith::default()).build().unwrap();

        let report = energy_balance_mut(&mut object, &meteo(), &Constants::default()).unwrap();

        assert_eq!(report.steps, 1);
        assert!(report.all_converged());

        let status = &object.status()[0];
        assert!(status["iter"] < MonteithParameters::default().maxiter as f64);
        // Little radiation and open stomata: transpiration cools the leaf below the air
        assert!(
            status["Tl"] < 22.0 && status["Tl"] > 14.0,
            "Unexpected leaf temperature {}",
            status["Tl"]
        );
        assert!(status["A"] > 0.0);
        assert!(status["Gs"] > 0.0);
        assert!(status["Ci"] < status["Cs"] && status["Cs"] < 400.0);
        assert!(is_close!(status["Rn"], status["H"] + status["lambdaE"]));
    }

    #[test]
    fn test_warm_start_converges_immediately() {
        let monteith = Monteith::from_parameters(MonteithParameters {
            warm_start: true,
            ..MonteithParameters::default()
        });
        let mut object = leaf(monteith).build().unwrap();
        let constants = Constants::default();

        // Nothing to start from yet: same as a cold start
        energy_balance_mut(&mut object, &meteo(), &constants).unwrap();
        let first = object.status()[0].clone();
        assert!(first["iter"] > 1.0);

        energy_balance_mut(&mut object, &meteo(), &constants).unwrap();
        let second = &object.status()[0];
        assert_eq!(second["iter"], 1.0);
        assert_relative_eq!(second["Tl"], first["Tl"], epsilon = 0.01);
        assert_relative_eq!(second["A"], first["A"], max_relative = 1e-2);
    }

    #[test]
    fn test_iterative_photosynthesis_gives_the_same_leaf() {
        let analytical = leaf(Monteith::default()).build().unwrap();
        let iterative = leaf(Monteith::default())
            .with_photosynthesis(FvcbIter::default())
            .build()
            .unwrap();
        let constants = Constants::default();

        let analytical = energy_balance(&analytical, &meteo(), &constants).unwrap();
        let iterative = energy_balance(&iterative, &meteo(), &constants).unwrap();

        for var in ["Tl", "A", "Gs", "Ci", "lambdaE"] {
            assert_relative_eq!(analytical[0][var], iterative[0][var], max_relative = 1e-4);
        }
    }

    #[test]
    fn test_capped_photosynthesis_is_reported() {
        let mut object = leaf(Monteith::default())
            .with_photosynthesis(FvcbIter {
                max_iter: 1,
                ..FvcbIter::default()
            })
            .build()
            .unwrap();

        let report = energy_balance_mut(&mut object, &meteo(), &Constants::default()).unwrap();

        assert_eq!(report.steps, 2);
        assert!(report.exhausted >= 1);
        assert!(!report.all_converged());
    }

    #[test]
    fn test_uncoupled_photosynthesis_needs_conductance() {
        let mut object = ModelList::builder()
            .with_energy_balance(Monteith::default())
            .with_photosynthesis(FvcbRaw::default())
            .with_status([("Rs", 13.747), ("sky_fraction", 1.0), ("PPFD", 1500.0), ("d", 0.03)])
            .with_init_policy(InitPolicy::Strict)
            .build()
            .unwrap();

        let err = energy_balance_mut(&mut object, &meteo(), &Constants::default()).unwrap_err();
        assert_eq!(
            err,
            BiophysError::UninitializedVariables(vec!["Ci".to_string(), "Gs".to_string()])
        );

        // Even when supplied, Gs has to come from the photosynthesis model
        let mut object = ModelList::builder()
            .with_energy_balance(Monteith::default())
            .with_photosynthesis(FvcbRaw::default())
            .with_status([
                ("Rs", 13.747),
                ("sky_fraction", 1.0),
                ("PPFD", 1500.0),
                ("d", 0.03),
                ("Ci", 300.0),
                ("Gs", 0.3),
            ])
            .with_init_policy(InitPolicy::Strict)
            .build()
            .unwrap();
        let err = energy_balance_mut(&mut object, &meteo(), &Constants::default()).unwrap_err();
        assert!(matches!(err, BiophysError::MissingOutput { .. }));
    }

    #[test]
    fn test_missing_photosynthesis_is_an_error() {
        let mut object = ModelList::builder()
            .with_energy_balance(Monteith::default())
            .with_status([("Rs", 13.747), ("sky_fraction", 1.0), ("d", 0.03)])
            .build()
            .unwrap();

        let err = energy_balance_mut(&mut object, &meteo(), &Constants::default()).unwrap_err();
        assert!(matches!(
            err,
            BiophysError::MissingProcess {
                process: Process::Photosynthesis,
                ..
            }
        ));
    }
}

mod dispatch {
    use super::*;

    #[test]
    fn test_absent_energy_balance_is_a_no_op() {
        let mut object = ModelList::builder()
            .with_photosynthesis(Fvcb::default())
            .with_stomatal_conductance(Medlyn::new(0.03, 12.0))
            .with_status([("PPFD", 1500.0), ("Tl", 25.0), ("Cs", 400.0), ("Dl", 1.0)])
            .build()
            .unwrap();
        let before = object.status().clone();

        let report = energy_balance_mut(&mut object, &meteo(), &Constants::default()).unwrap();

        assert_eq!(report.steps, 0);
        assert_eq!(object.status(), &before);
    }

    #[test]
    fn test_strict_policy_refuses_to_simulate() {
        let mut object = leaf(Monteith::default())
            .with_status_value("d", -f64::INFINITY)
            .with_init_policy(InitPolicy::Strict)
            .build()
            .unwrap();
        let before = object.status().clone();

        let err = energy_balance_mut(&mut object, &meteo(), &Constants::default()).unwrap_err();

        assert_eq!(err, BiophysError::UninitializedVariables(vec!["d".to_string()]));
        assert_eq!(object.status(), &before);
    }

    #[test]
    fn test_lenient_policy_simulates_anyway() {
        let mut object = leaf(Monteith::default())
            .with_status_value("sky_fraction", -f64::INFINITY)
            .build()
            .unwrap();

        assert!(energy_balance_mut(&mut object, &meteo(), &Constants::default()).is_ok());
    }

    #[test]
    fn test_light_interception_needs_radiation() {
        let mut object = ModelList::builder()
            .with_light_interception(Beer::default())
            .with_status_value("LAI", 2.0)
            .build()
            .unwrap();

        let err = light_interception_mut(&mut object, &meteo(), &Constants::default()).unwrap_err();
        assert!(matches!(err, BiophysError::MissingMeteo { .. }));
    }
}

mod time_series {
    use super::*;

    fn daily_weather(constants: &Constants) -> Weather {
        Weather::from_records(
            [50.0, 150.0, 300.0]
                .into_iter()
                .map(|par| MeteoRecord {
                    ri_par_f: Some(par),
                    ..MeteoRecord::new(22.0, 0.8333, 101.325, 0.4490995)
                })
                .collect(),
            constants,
        )
        .with_metadata("site", "test")
    }

    fn canopy_leaf() -> ModelList {
        ModelList::builder()
            .with_light_interception(Beer::default())
            .with_energy_balance(Monteith::default())
            .with_photosynthesis(Fvcb::default())
            .with_stomatal_conductance(Medlyn::new(0.03, 12.0))
            .with_status([("LAI", 1.0), ("Rs", 100.0), ("sky_fraction", 1.0), ("d", 0.03)])
            .build()
            .unwrap()
    }

    #[test]
    fn test_simulate_over_weather() {
        let constants = Constants::default();
        let weather = daily_weather(&constants);
        let mut object = canopy_leaf();
        assert_eq!(
            object.execution_order().unwrap(),
            vec![Process::LightInterception, Process::EnergyBalance]
        );

        let report = simulate_mut(&mut object, &weather, &constants).unwrap();

        assert_eq!(report.steps, 3);
        assert!(report.all_converged());
        assert_eq!(object.status().len(), 3);

        let ppfd = object.status().column("PPFD").unwrap();
        let a = object.status().column("A").unwrap();
        assert!(ppfd[0] < ppfd[1] && ppfd[1] < ppfd[2]);
        assert!(a[0] < a[1] && a[1] < a[2]);

        let table = object.status().to_array().unwrap();
        assert_eq!(table.nrows(), 3);
        assert_eq!(table.ncols(), object.status().variables().len());
    }

    #[test]
    fn test_simulate_copy_returns_the_table() {
        let constants = Constants::default();
        let weather = daily_weather(&constants);
        let object = canopy_leaf();

        let table = simulate(&object, &weather, &constants).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(object.status().len(), 1);
        assert!(table.iter().all(|status| status["Tl"].is_finite()));
    }
}

mod many_objects {
    use super::*;

    #[test]
    fn test_objects_are_simulated_independently() {
        let constants = Constants::default();
        let mut objects: BTreeMap<String, ModelList> = [("conservative", 4.0), ("wasteful", 12.0)]
            .into_iter()
            .map(|(name, g1)| {
                let object = leaf(Monteith::default())
                    .with_stomatal_conductance(Medlyn::new(0.03, g1))
                    .build()
                    .unwrap();
                (name.to_string(), object)
            })
            .collect();

        let report = simulate_mut(&mut objects, &meteo(), &constants).unwrap();

        assert_eq!(report.steps, 2);
        let conservative = &objects["conservative"].status()[0];
        let wasteful = &objects["wasteful"].status()[0];
        assert!(wasteful["Gs"] > conservative["Gs"]);
        assert!(wasteful["lambdaE"] > conservative["lambdaE"]);
        assert!(wasteful["Tl"] < conservative["Tl"]);
    }

    #[test]
    fn test_same_objects_give_the_same_result() {
        let constants = Constants::default();
        let objects = vec![leaf(Monteith::default()).build().unwrap(); 8];

        let tables = simulate(&objects, &meteo(), &constants).unwrap();

        assert_eq!(tables.len(), 8);
        assert!(tables.iter().all(|table| table == &tables[0]));
    }
}

mod configuration {
    use super::*;

    #[test]
    fn test_models_from_toml() {
        let models: ProcessModels = toml::from_str(
            r#"
            [energy_balance]
            model = "Monteith"
            maxiter = 20

            [photosynthesis]
            model = "Fvcb"
            vcmax_ref = 150.0

            [stomatal_conductance]
            model = "Medlyn"
            g0 = 0.03
            g1 = 12.0
            "#,
        )
        .unwrap();

        let mut object = ModelList::builder()
            .with_models(models)
            .with_status([
                ("Rs", 13.747),
                ("sky_fraction", 1.0),
                ("PPFD", 1500.0),
                ("d", 0.03),
            ])
            .build()
            .unwrap();
        assert!(object.is_initialized());

        let report = simulate_mut(&mut object, &meteo(), &Constants::default()).unwrap();
        assert!(report.all_converged());
    }

    #[test]
    fn test_models_round_trip_through_json() {
        let object = leaf(Monteith::default())
            .with_light_interception(Beer::new(0.6))
            .build()
            .unwrap();

        let json = serde_json::to_string(object.models()).unwrap();
        let models: ProcessModels = serde_json::from_str(&json).unwrap();

        assert_eq!(&models, object.models());
        assert!(json.contains(r#""model":"Beer""#));
    }
}
