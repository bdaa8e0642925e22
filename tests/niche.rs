use foodwebs::{Generator, NicheConfig, NicheModel};

fn config(n_species: usize, connectance: f64, seed: u64) -> NicheConfig {
    NicheConfig {
        n_species,
        connectance,
        seed: Some(seed),
    }
}

#[test]
fn generated_web_has_no_defects() {
    let mut model = NicheModel::new(&config(10, 0.2, 1)).expect("failed to construct model");
    let web = model.generate().expect("failed to generate web");

    assert_eq!(web.n_species(), 10);

    for id in 0..web.n_species() {
        assert!(!web.is_isolate(id), "species {id} is isolated");
    }

    let signatures: Vec<_> = (0..web.n_species())
        .map(|id| web.trophic_signature(id))
        .collect();
    for a in 0..signatures.len() {
        for b in a + 1..signatures.len() {
            assert_ne!(
                signatures[a], signatures[b],
                "species {a} and {b} are trophically identical"
            );
        }
    }
}

#[test]
fn webs_never_contain_self_loops() {
    for seed in 0..5 {
        let mut model =
            NicheModel::new(&config(12, 0.15, seed)).expect("failed to construct model");
        let web = model.generate().expect("failed to generate web");
        for (prey, consumer) in web.links() {
            assert_ne!(prey, consumer, "species {prey} consumes itself");
        }
    }
}

#[test]
fn a_basal_species_always_exists() {
    for seed in 0..5 {
        let mut model =
            NicheModel::new(&config(15, 0.25, seed)).expect("failed to construct model");
        let web = model.generate().expect("failed to generate web");
        let basal = (0..web.n_species()).any(|id| web.in_degree(id) == 0);
        assert!(basal, "no species with in-degree 0 for seed {seed}");
    }
}

#[test]
fn same_seed_reproduces_web() {
    let mut first = NicheModel::new(&config(10, 0.2, 1)).expect("failed to construct model");
    let mut second = NicheModel::new(&config(10, 0.2, 1)).expect("failed to construct model");

    let web_a = first.generate().expect("failed to generate web");
    let web_b = second.generate().expect("failed to generate web");
    assert_eq!(web_a.n_species(), web_b.n_species());
    assert_eq!(web_a.links(), web_b.links());

    // Later draws from the same stream stay aligned too.
    let web_a2 = first.generate().expect("failed to generate web");
    let web_b2 = second.generate().expect("failed to generate web");
    assert_eq!(web_a2.links(), web_b2.links());
}

#[test]
fn params_describe_the_returned_web() {
    let mut model = NicheModel::new(&config(10, 0.2, 1)).expect("failed to construct model");
    assert!(model.params().is_none());

    let web = model.generate().expect("failed to generate web");
    let params = model.params().expect("params missing after generation");

    assert_eq!(params.niche.len(), 10);
    let mut n_basal = 0;
    for i in 0..10 {
        assert!((0.0..=1.0).contains(&params.niche[i]));
        assert!(params.range[i] >= 0.0 && params.range[i] <= params.niche[i]);
        assert!(params.center[i] >= params.range[i] / 2.0);
        assert!(params.center[i] <= params.niche[i]);
        if params.range[i] == 0.0 {
            n_basal += 1;
        }
    }
    assert!(n_basal >= 1, "no species with range 0");

    // The web is exactly the one wired by the feeding-interval rule.
    for i in 0..10 {
        let lower = params.center[i] - params.range[i] / 2.0;
        let upper = params.center[i] + params.range[i] / 2.0;
        for j in 0..10 {
            let expected = i != j && lower < params.niche[j] && params.niche[j] < upper;
            assert_eq!(
                web.has_link(j, i),
                expected,
                "link ({j} -> {i}) disagrees with the feeding interval"
            );
        }
    }
}

#[test]
fn minimum_niche_species_is_basal() {
    let mut model = NicheModel::new(&config(20, 0.1, 7)).expect("failed to construct model");
    model.generate().expect("failed to generate web");
    let params = model.params().expect("params missing after generation");

    let mut basal = 0;
    for i in 1..params.niche.len() {
        if params.niche[i] < params.niche[basal] {
            basal = i;
        }
    }
    assert_eq!(params.range[basal], 0.0);
}

#[test]
fn rejects_invalid_configuration() {
    assert!(NicheModel::new(&config(1, 0.2, 0)).is_err());
    assert!(NicheModel::new(&config(0, 0.2, 0)).is_err());

    for connectance in [0.0, 0.5, 0.6, -0.1] {
        let error = NicheModel::new(&config(10, connectance, 0))
            .err()
            .unwrap_or_else(|| panic!("connectance {connectance} was accepted"));
        assert!(format!("{error:#}").contains("connectance"));
    }
}
