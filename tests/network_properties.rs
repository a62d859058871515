use ibex_governance::{
    analyze_network, consolidate, get_node_metrics, load_snapshot, save_snapshot, setup_database,
    latest_snapshot, Company, Director, NodeKind, Shareholder,
};
use rusqlite::Connection;

fn ibex_sample() -> Vec<Company> {
    vec![
        Company::new("SAN.MC", "Banco Santander", "Banking", 9.1e10)
            .with_director(Director::new("Ana Botín").with_position("Presidenta"))
            .with_director(Director::new("Luis Isasi"))
            .with_shareholder(Shareholder::new("BlackRock", 5.4))
            .with_shareholder(Shareholder::new("Norges Bank", 2.9)),
        Company::new("TEF.MC", "Telefónica", "Telecom", 2.2e10)
            .with_director(Director::new(" luis isasi "))
            .with_director(Director::new("Javier de Paz"))
            .with_shareholder(Shareholder::new("SEPI", 10.0))
            .with_shareholder(Shareholder::new("BlackRock", 4.5))
            .with_shareholder(Shareholder::new("", 3.0)),
        Company::new("IBE.MC", "Iberdrola", "Utilities", 8.5e10)
            .with_director(Director::new("Ignacio Galán"))
            .with_shareholder(Shareholder::new("Qatar Investment Authority", 8.7))
            .with_shareholder(Shareholder::new("blackrock", 5.2)),
    ]
}

#[test]
fn test_total_nodes_equals_companies_plus_consolidated_entities() {
    let companies = ibex_sample();
    let consolidation = consolidate(&companies);
    let analysis = analyze_network(&companies);

    assert_eq!(
        analysis.total_nodes,
        companies.len() + consolidation.directors.len() + consolidation.shareholders.len()
    );
    // 3 companies, 4 directors, 4 shareholders (blank name dropped)
    assert_eq!(analysis.total_nodes, 11);
}

#[test]
fn test_degree_matches_connections_and_entity_links() {
    let companies = ibex_sample();
    let consolidation = consolidate(&companies);
    let analysis = analyze_network(&companies);

    for node in &analysis.nodes {
        assert_eq!(node.metrics.degree, node.connections.len());
        if node.kind != NodeKind::Company {
            assert_eq!(node.company_count, node.connections.len());
        }
    }

    let blackrock = analysis.node("shr_blackrock").unwrap();
    let expected: Vec<&String> = consolidation.shareholders["blackrock"].companies.iter().collect();
    let actual: Vec<&String> = blackrock.connections.iter().collect();
    assert_eq!(actual, expected);

    // TEF: 2 directors + 2 named shareholders
    assert_eq!(analysis.node("TEF.MC").unwrap().metrics.degree, 4);
}

#[test]
fn test_summary_values_never_nan_or_negative() {
    let inputs = vec![
        vec![],
        vec![Company::new("ELE.MC", "Endesa", "Utilities", 0.0)],
        vec![Company::new("", "No ticker", "?", 1.0).with_director(Director::new("X"))],
        ibex_sample(),
    ];

    for companies in inputs {
        let analysis = analyze_network(&companies);
        for value in [analysis.network_density, analysis.average_degree] {
            assert!(value.is_finite() && value >= 0.0);
        }
        if analysis.total_nodes <= 1 {
            assert_eq!(analysis.network_density, 0.0);
        }
        for node in &analysis.nodes {
            let m = node.metrics;
            for value in [m.betweenness, m.closeness, m.centrality, m.influence] {
                assert!(value.is_finite() && value >= 0.0, "{}: {:?}", node.id, m);
            }
        }
    }
}

#[test]
fn test_analysis_is_idempotent() {
    let companies = ibex_sample();
    let first = analyze_network(&companies);
    let second = analyze_network(&companies);

    assert_eq!(first, second);
}

#[test]
fn test_accented_and_spaced_names() {
    let companies = vec![
        Company::new("SAN.MC", "Santander", "Banking", 1e10).with_director(Director::new("Ana García")),
        Company::new("BBVA.MC", "BBVA", "Banking", 1e10).with_director(Director::new(" ana garcía ")),
        Company::new("CABK.MC", "CaixaBank", "Banking", 1e10).with_director(Director::new("Ana Garcia")),
    ];

    let analysis = analyze_network(&companies);
    let directors: Vec<_> = analysis.nodes.iter().filter(|n| n.kind == NodeKind::Director).collect();
    assert_eq!(directors.len(), 2);

    let accented = directors.iter().find(|n| n.name == "Ana García").unwrap();
    assert_eq!(accented.company_count, 2);
    let plain = directors.iter().find(|n| n.name == "Ana Garcia").unwrap();
    assert_eq!(plain.company_count, 1);
}

#[test]
fn test_single_company_scenario() {
    let companies = vec![Company::new("ACS.MC", "ACS", "Construction", 1e10)
        .with_director(Director::new("Juan Perez"))
        .with_shareholder(Shareholder::new("BlackRock", 5.2))];

    let analysis = analyze_network(&companies);
    assert_eq!(analysis.total_nodes, 3);
    assert_eq!(analysis.total_edges, 2);

    let juan = analysis.node("dir_juan_perez").unwrap();
    assert_eq!(juan.company_count, 1);

    let blackrock = analysis.node("shr_blackrock").unwrap();
    assert_eq!(blackrock.total_percentage, 5.2);

    // 2 edges over 3 possible pairs
    assert!((analysis.network_density - 2.0 / 3.0).abs() < 1e-12);
    assert!((analysis.average_degree - 4.0 / 3.0).abs() < 1e-12);

    let acs = get_node_metrics("ACS.MC", &analysis).unwrap();
    assert_eq!(acs.degree, 2);
    assert_eq!(acs.betweenness, 1.0);
}

#[test]
fn test_shared_director_scenario() {
    let companies = vec![
        Company::new("ACS.MC", "ACS", "Construction", 1e10)
            .with_director(Director::new("Juan Perez"))
            .with_shareholder(Shareholder::new("BlackRock", 5.2)),
        Company::new("FER.MC", "Ferrovial", "Construction", 2e10)
            .with_director(Director::new("Juan Perez"))
            .with_shareholder(Shareholder::new("Rafael del Pino", 20.0)),
    ];

    let analysis = analyze_network(&companies);
    assert_eq!(analysis.total_edges, 4);

    let juan = analysis.node("dir_juan_perez").unwrap();
    assert_eq!(juan.company_count, 2);
    assert_eq!(analysis.cross_board_directors.len(), 1);
    assert_eq!(analysis.cross_board_directors[0].id, "dir_juan_perez");

    assert_eq!(analysis.board_interlocks.len(), 1);
    assert_eq!(analysis.board_interlocks[0].shared_directors, vec!["Juan Perez".to_string()]);

    // 20% holder passes the 0.1 influence bar, 5.2% does not
    let majors: Vec<&str> = analysis.major_shareholders.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(majors, vec!["shr_rafael_del_pino"]);
}

#[test]
fn test_empty_companies_scenario() {
    let analysis = analyze_network(&[]);

    assert_eq!(analysis.total_nodes, 0);
    assert_eq!(analysis.total_edges, 0);
    assert_eq!(analysis.network_density, 0.0);
    assert_eq!(analysis.average_degree, 0.0);
    assert!(analysis.key_influencers.is_empty());
    assert!(analysis.cross_board_directors.is_empty());
    assert!(analysis.major_shareholders.is_empty());
}

#[test]
fn test_sheets_to_cache_to_analysis() {
    let companies_csv = "isin,ticker,company,sector,market_cap_eur\n\
ES0167050915,ACS.MC,ACS,Construction,10000000000\n\
ES0118900010,FER.MC,Ferrovial,Construction,20000000000\n";
    let directors_csv = "isin,name,position\n\
ES0167050915,Juan Perez,Consejero\n\
ES0118900010,JUAN PEREZ,Presidente\n";
    let shareholders_csv = "isin,name,percentage\n\
ES0167050915,BlackRock,\"5,2\"\n";

    let report = load_snapshot(
        companies_csv.as_bytes(),
        directors_csv.as_bytes(),
        shareholders_csv.as_bytes(),
    )
    .unwrap();

    let conn = Connection::open_in_memory().unwrap();
    setup_database(&conn).unwrap();
    save_snapshot(&conn, &report.companies).unwrap();

    let snapshot = latest_snapshot(&conn).unwrap().unwrap();
    let analysis = analyze_network(&snapshot.companies);

    assert_eq!(analysis.total_nodes, 4);
    assert_eq!(analysis.total_edges, 3);

    let juan = analysis.node("dir_juan_perez").unwrap();
    assert_eq!(juan.company_count, 2);
    assert_eq!(juan.positions, vec!["Consejero".to_string(), "Presidente".to_string()]);
}
