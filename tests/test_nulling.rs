//! Meta-nulling system: construction, objective, gradient, optimization loop.

use num_complex::Complex64;

use gra::config::GraConfig;
use gra::domain::DomainGoal;
use gra::foam;
use gra::hilbert::HilbertSpace;
use gra::nulling::GraMetaNulling;
use gra::optimizer::{OptimizerKind, Sgd};
use gra::types::*;

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

/// Three domains sharing a rank-3 goal inside C^4: the optimum places the
/// states on three mutually orthogonal goal directions (J = 0).
fn shared_goal_domains() -> Vec<DomainGoal> {
    ["vision", "language", "motor"]
        .iter()
        .map(|name| DomainGoal::coordinate(name, 4, 3).unwrap())
        .collect()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn assert_unit_norms(g: &GraMetaNulling) {
    for psi in &g.psi_states {
        assert!((psi.norm() - 1.0).abs() < 1e-10, "norm = {}", psi.norm());
    }
}

// =========================================================================
// 1. Construction
// =========================================================================

#[test]
fn new_states_are_normalized_and_sized() {
    let g = GraMetaNulling::new(shared_goal_domains(), 1.0, 7).unwrap();
    assert_eq!(g.m(), 3);
    assert_eq!(g.psi_states.len(), 3);
    for psi in &g.psi_states {
        assert_eq!(psi.dim(), 4);
    }
    assert_unit_norms(&g);
}

#[test]
fn same_seed_same_states() {
    let a = GraMetaNulling::new(shared_goal_domains(), 1.0, 42).unwrap();
    let b = GraMetaNulling::new(shared_goal_domains(), 1.0, 42).unwrap();
    let other = GraMetaNulling::new(shared_goal_domains(), 1.0, 43).unwrap();
    assert_eq!(a.psi_states, b.psi_states);
    assert_ne!(a.psi_states, other.psi_states);
}

#[test]
fn random_states_have_nonzero_imaginary_parts() {
    let g = GraMetaNulling::new(shared_goal_domains(), 1.0, 3).unwrap();
    let im: f64 = g.psi_states.iter().flat_map(|p| p.data.iter()).map(|z| z.im.abs()).sum();
    assert!(im > 0.0);
}

#[test]
fn empty_domain_list_rejected() {
    assert!(GraMetaNulling::new(Vec::new(), 1.0, 0).is_err());
}

#[test]
fn negative_lambda_rejected() {
    assert!(GraMetaNulling::new(shared_goal_domains(), -1.0, 0).is_err());
}

#[test]
fn mismatched_domain_dimensions_rejected() {
    let domains = vec![
        DomainGoal::coordinate("a", 3, 1).unwrap(),
        DomainGoal::coordinate("b", 4, 1).unwrap(),
    ];
    assert!(GraMetaNulling::new(domains, 1.0, 0).is_err());
}

#[test]
fn from_states_checks_and_normalizes() {
    let domains = vec![DomainGoal::coordinate("a", 2, 1).unwrap()];
    let g = GraMetaNulling::from_states(domains.clone(), 1.0, vec![ComplexVec::from_real(&[3.0, 4.0])])
        .unwrap();
    assert!((g.psi_states[0].data[0].re - 0.6).abs() < 1e-12);
    assert!((g.psi_states[0].data[1].re - 0.8).abs() < 1e-12);

    assert!(GraMetaNulling::from_states(domains.clone(), 1.0, vec![ComplexVec::zeros(3)]).is_err());
    assert!(GraMetaNulling::from_states(domains, 1.0, vec![]).is_err());
}

// =========================================================================
// 2. Objective
// =========================================================================

#[test]
fn j_meta_combines_local_and_meta() {
    let domains = vec![
        DomainGoal::coordinate("a", 2, 1).unwrap(),
        DomainGoal::new("b", ComplexMatrix::diag(&[0.0, 1.0]), 2).unwrap(),
    ];
    let states = vec![ComplexVec::from_real(&[1.0, 1.0]), ComplexVec::basis(2, 0)];
    let g = GraMetaNulling::from_states(domains, 2.0, states).unwrap();

    // psi_a = (1,1)/sqrt2 under diag(1,0): (0.5 - 1)^2 = 0.25
    // psi_b = e0 under diag(0,1): (0 - 1)^2 = 1
    let locals = g.local_foams().unwrap();
    assert!((locals[0] - 0.25).abs() < 1e-12);
    assert!((locals[1] - 1.0).abs() < 1e-12);

    // P_tot = I/2: |<psi_a|P_tot|e0>|^2 = (0.5/sqrt2)^2 = 0.125
    let meta = g.meta_foam().unwrap();
    assert!((meta - 0.125).abs() < 1e-12);

    let j = g.j_meta().unwrap();
    assert!((j - (1.25 + 2.0 * 0.125)).abs() < 1e-12);
}

#[test]
fn local_foam_accepts_candidate_state() {
    let g = GraMetaNulling::new(shared_goal_domains(), 1.0, 1).unwrap();
    let inside = ComplexVec::basis(4, 1);
    let outside = ComplexVec::basis(4, 3);
    assert!(g.local_foam(0, &inside).unwrap() < 1e-15);
    assert!((g.local_foam(0, &outside).unwrap() - 1.0).abs() < 1e-15);
    assert!(g.local_foam(5, &inside).is_err());
}

#[test]
fn single_domain_has_no_meta_foam() {
    let domains = vec![DomainGoal::coordinate("solo", 3, 2).unwrap()];
    let g = GraMetaNulling::new(domains, 10.0, 5).unwrap();
    assert_eq!(g.meta_foam().unwrap(), 0.0);
    let local: f64 = g.local_foams().unwrap().iter().sum();
    assert!((g.j_meta().unwrap() - local).abs() < 1e-15);
}

#[test]
fn gradient_matches_finite_difference_of_j() {
    let domains = vec![
        DomainGoal::coordinate("a", 3, 2).unwrap(),
        DomainGoal::new(
            "b",
            ComplexMatrix::new(
                vec![
                    c(0.5, 0.0), c(0.1, 0.2), c(0.0, 0.0),
                    c(0.1, -0.2), c(0.3, 0.0), c(0.0, 0.1),
                    c(0.0, 0.0), c(0.0, -0.1), c(0.9, 0.0),
                ],
                3,
                3,
            )
            .unwrap(),
            3,
        )
        .unwrap(),
        DomainGoal::coordinate("c", 3, 1).unwrap(),
    ];
    let g = GraMetaNulling::new(domains, 0.7, 11).unwrap();
    let grads = g.gradient().unwrap();
    let projectors: Vec<&ComplexMatrix> = g.domains.iter().map(|d| &d.projector).collect();

    // J evaluated on raw (unnormalized) perturbed states.
    let j_of = |states: &[ComplexVec]| -> f64 {
        let local: f64 = states
            .iter()
            .zip(g.domains.iter())
            .map(|(s, d)| foam::local_foam(s, &d.projector).unwrap())
            .sum();
        local + 0.7 * foam::compute_meta_foam(states, &projectors).unwrap()
    };

    let h = 1e-6;
    for a in 0..g.m() {
        for k in 0..3 {
            for (dir, component) in [(c(h, 0.0), 0), (c(0.0, h), 1)] {
                let mut plus = g.psi_states.clone();
                let mut minus = g.psi_states.clone();
                plus[a].data[k] += dir;
                minus[a].data[k] -= dir;
                let numeric = (j_of(&plus) - j_of(&minus)) / (2.0 * h);
                let analytic = if component == 0 { grads[a].data[k].re } else { grads[a].data[k].im };
                assert!((numeric - analytic).abs() < 1e-5, "domain {a} comp {k}: {numeric} vs {analytic}");
            }
        }
    }
}

// =========================================================================
// 3. Optimization loop
// =========================================================================

#[test]
fn optimize_reduces_objective_and_keeps_unit_norm() {
    init_tracing();
    let mut g = GraMetaNulling::new(shared_goal_domains(), 1.0, 42).unwrap();
    let initial = g.j_meta().unwrap();
    let history = g.optimize(600, 0.02).unwrap();

    assert_eq!(history.epochs(), 600);
    assert_eq!(history.local_foams.len(), 600);
    assert_eq!(history.meta_foam.len(), 600);
    assert!(history.local_foams.iter().all(|l| l.len() == 3));
    assert!((history.j[0] - initial).abs() < 1e-12);

    let last = history.final_objective(1.0).unwrap();
    assert!(last < initial, "J did not decrease: {initial} -> {last}");
    assert!(last < 0.05, "final J too large: {last}");
    assert!((g.j_meta().unwrap() - last).abs() < 1e-12);
    assert_unit_norms(&g);
}

#[test]
fn sgd_reduces_objective() {
    let mut g = GraMetaNulling::new(shared_goal_domains(), 1.0, 9).unwrap();
    let initial = g.j_meta().unwrap();
    let config = GraConfig {
        optimizer: OptimizerKind::Sgd,
        lr: 0.05,
        epochs: 400,
        ..GraConfig::default()
    };
    let history = g.optimize_with(&config).unwrap();
    let last = history.final_objective(1.0).unwrap();
    assert!(last < initial);
    assert_unit_norms(&g);
}

#[test]
fn tolerance_stops_early() {
    let mut g = GraMetaNulling::new(shared_goal_domains(), 1.0, 4).unwrap();
    let config = GraConfig {
        optimizer: OptimizerKind::Sgd,
        lr: 0.05,
        epochs: 5000,
        tolerance: Some(1e-6),
        ..GraConfig::default()
    };
    let history = g.optimize_with(&config).unwrap();
    assert!(history.epochs() < 5000);
    assert!(history.epochs() > 1);
}

#[test]
fn zero_epochs_gives_empty_history() {
    let mut g = GraMetaNulling::new(shared_goal_domains(), 1.0, 4).unwrap();
    let before = g.psi_states.clone();
    let history = g.optimize(0, 0.01).unwrap();
    assert!(history.is_empty());
    assert_eq!(history.final_j(), None);
    assert_eq!(g.psi_states, before);
}

#[test]
fn invalid_learning_rate_rejected() {
    let mut g = GraMetaNulling::new(shared_goal_domains(), 1.0, 4).unwrap();
    assert!(g.optimize(10, 0.0).is_err());
    assert!(g.optimize(10, f64::NAN).is_err());
}

#[test]
fn run_with_custom_optimizer() {
    let mut g = GraMetaNulling::new(shared_goal_domains(), 1.0, 8).unwrap();
    let mut opt = Sgd::new(0.01);
    let config = GraConfig { epochs: 5, ..GraConfig::default() };
    let history = g.run(&mut opt, &config).unwrap();
    assert_eq!(history.epochs(), 5);
}

#[test]
fn zero_state_is_left_untouched() {
    init_tracing();
    let domains = vec![
        DomainGoal::coordinate("a", 2, 1).unwrap(),
        DomainGoal::coordinate("b", 2, 1).unwrap(),
    ];
    let states = vec![ComplexVec::zeros(2), ComplexVec::basis(2, 1)];
    let mut g = GraMetaNulling::from_states(domains, 1.0, states).unwrap();
    assert_eq!(g.renormalize(), vec![0]);

    let history = g.optimize(3, 0.01).unwrap();
    assert_eq!(history.epochs(), 3);
    assert_eq!(g.psi_states[0].norm(), 0.0);
    assert!((g.psi_states[1].norm() - 1.0).abs() < 1e-12);
}

#[test]
fn svd_built_domains_optimize() {
    let h = HilbertSpace::new(3).unwrap();
    let goal_a = ComplexMatrix::new(
        vec![c(1.0, 0.0), c(0.0, 0.0), c(0.0, 1.0), c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0)],
        3,
        2,
    )
    .unwrap();
    let goal_b = ComplexMatrix::new(vec![c(0.0, 0.0), c(1.0, 0.0), c(1.0, 1.0)], 3, 1).unwrap();
    let domains = vec![
        DomainGoal::from_goal_states("a", &h, &goal_a).unwrap(),
        DomainGoal::from_goal_states("b", &h, &goal_b).unwrap(),
    ];
    let mut g = GraMetaNulling::new(domains, 0.5, 21).unwrap();
    let initial = g.j_meta().unwrap();
    let history = g.optimize(300, 0.02).unwrap();
    assert!(history.final_objective(0.5).unwrap() < initial);
    assert_unit_norms(&g);
}

#[test]
fn from_config_uses_seed_and_lambda() {
    let config = GraConfig { lambda_meta: 0.25, seed: 99, ..GraConfig::default() };
    let a = GraMetaNulling::from_config(shared_goal_domains(), &config).unwrap();
    let b = GraMetaNulling::new(shared_goal_domains(), 0.25, 99).unwrap();
    assert_eq!(a.lambda_meta, 0.25);
    assert_eq!(a.psi_states, b.psi_states);
}

#[test]
fn run_applies_config_lambda() {
    let mut g = GraMetaNulling::new(shared_goal_domains(), 1.0, 8).unwrap();
    let mut reweighted = g.clone();
    reweighted.lambda_meta = 0.25;
    let expected_j0 = reweighted.j_meta().unwrap();

    let mut opt = Sgd::new(0.01);
    let config = GraConfig { lambda_meta: 0.25, epochs: 2, ..GraConfig::default() };
    let history = g.run(&mut opt, &config).unwrap();
    assert_eq!(g.lambda_meta, 0.25);
    assert!((history.j[0] - expected_j0).abs() < 1e-12);
}

#[test]
fn non_finite_state_is_degenerate_and_stops_the_loop() {
    init_tracing();
    let domains = vec![
        DomainGoal::coordinate("a", 2, 1).unwrap(),
        DomainGoal::coordinate("b", 2, 1).unwrap(),
    ];
    let states = vec![
        ComplexVec::new(vec![c(f64::NAN, 0.0), c(1.0, 0.0)]),
        ComplexVec::basis(2, 1),
    ];
    let mut g = GraMetaNulling::from_states(domains, 1.0, states).unwrap();
    assert_eq!(g.renormalize(), vec![0]);
    assert!(!g.psi_states[0].is_finite());
    assert!((g.psi_states[1].norm() - 1.0).abs() < 1e-12);

    assert!(g.optimize(3, 0.01).is_err());
}
