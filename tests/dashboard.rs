use bank_offer_analytics::{
    aggregate, parse_offers_payload, summarize, FinancingError, LoanType, Period,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const PAYLOAD: &str = r#"{
    "count": 8,
    "status": "success",
    "offers": [
        {"id": 1, "offer_id": "VOT-08", "bank_name": "Banco Votorantim S/A", "year": 2024, "month": 8,
         "monthly_interest_rate": "0.02630", "financed_amount": "42500.00000", "asset_value": "60000.00000",
         "total_value_with_interest": "85000.00000", "installments_count": 48, "type": "automobile",
         "offered": true, "offered_interest_rate": "0.01990", "savings_amount": "5230.10000",
         "created_at": "2024-08-12T10:00:00Z", "user_id": 7},
        {"id": 2, "offer_id": "VOT-07", "bank_name": "Banco Votorantim S/A", "year": 2024, "month": 7,
         "monthly_interest_rate": "0.02580", "financed_amount": "35000.00000", "asset_value": "50000.00000",
         "total_value_with_interest": "68000.00000", "installments_count": 36, "type": "automobile",
         "offered": true, "offered_interest_rate": "0.02100", "savings_amount": "2100.00000"},
        {"id": 3, "offer_id": "VOT-09", "bank_name": "Banco Votorantim S/A", "year": 2024, "month": 9,
         "monthly_interest_rate": "0.02690", "financed_amount": "48000.00000", "asset_value": "65000.00000",
         "total_value_with_interest": "92000.00000", "installments_count": 60, "type": "property",
         "offered": false, "offered_interest_rate": null, "savings_amount": null},
        {"id": 4, "offer_id": "BRA-08", "bank_name": "Banco Bradesco S/A", "year": 2024, "month": 8,
         "monthly_interest_rate": "0.02890", "financed_amount": "55000.00000", "asset_value": "75000.00000",
         "total_value_with_interest": "105000.00000", "installments_count": 48, "type": "automobile",
         "offered": true, "offered_interest_rate": "0.02200", "savings_amount": "1000.00000"},
        {"id": 5, "offer_id": "BRA-07", "bank_name": "Banco Bradesco S/A", "year": 2024, "month": 7,
         "monthly_interest_rate": "0.02850", "financed_amount": "60000.00000", "asset_value": "80000.00000",
         "total_value_with_interest": "115000.00000", "installments_count": 48, "type": "automobile",
         "offered": false, "savings_amount": "null"},
        {"id": 6, "offer_id": "ITA-08", "bank_name": "Banco Itau Unibanco S/A", "year": 2024, "month": 8,
         "monthly_interest_rate": "0.02720", "financed_amount": "38000.00000", "asset_value": "55000.00000",
         "total_value_with_interest": "78000.00000", "installments_count": 60, "type": "property",
         "offered": true, "offered_interest_rate": "0.02300"},
        {"id": 7, "offer_id": "ITA-08B", "bank_name": "Banco Itau Unibanco S/A", "year": 2024, "month": 8,
         "monthly_interest_rate": "0.03000", "financed_amount": "null", "asset_value": "10000.00000",
         "total_value_with_interest": "15000.00000", "installments_count": 24, "type": "automobile",
         "offered": false},
        {"id": 8, "offer_id": "SAN-08", "bank_name": "Banco Santander S/A", "year": 2024, "month": 8,
         "monthly_interest_rate": "0.02500", "asset_value": "20000.00000",
         "total_value_with_interest": "30000.00000", "installments_count": 24, "type": "automobile",
         "offered": false}
    ]
}"#;

#[test]
fn test_payload_drops_offers_without_balance() {
    let offers = parse_offers_payload(PAYLOAD).unwrap();
    assert_eq!(offers.len(), 6);
    assert!(offers.iter().all(|o| o.outstanding_balance > Decimal::ZERO));
}

#[test]
fn test_bank_statistics_from_payload() {
    let offers = parse_offers_payload(PAYLOAD).unwrap();
    let stats = aggregate(&offers);

    let names: Vec<&str> = stats.bank_names().collect();
    assert_eq!(
        names,
        vec!["Banco Votorantim S/A", "Banco Bradesco S/A", "Banco Itau Unibanco S/A"]
    );

    let votorantim = stats.get("Banco Votorantim S/A").unwrap();
    assert_eq!(votorantim.offer_count, 3);
    assert_eq!(votorantim.price_count, 2);
    assert_eq!(votorantim.sac_count, 1);
    assert_eq!(votorantim.covered_count, 2);
    assert_eq!(votorantim.total_financing, dec!(125500));
    assert_eq!(votorantim.total_interest_earned, dec!(119500));
    let expected = (dec!(0.0263) + dec!(0.0258) + dec!(0.0269)) / dec!(3);
    assert!((votorantim.avg_rate - expected).abs() < dec!(0.000000000001));

    let labels: Vec<&str> = votorantim
        .monthly_data()
        .iter()
        .map(|bucket| bucket.month.as_str())
        .collect();
    assert_eq!(labels, vec!["8/2024", "7/2024", "9/2024"]);

    let bradesco = stats.get("Banco Bradesco S/A").unwrap();
    assert_eq!(bradesco.avg_rate, dec!(0.0287));
    assert_eq!(bradesco.covered_count, 1);

    let itau = stats.get("Banco Itau Unibanco S/A").unwrap();
    assert_eq!(itau.offer_count, 1);
    assert_eq!(itau.sac_count, 1);
    assert_eq!(
        itau.bucket(&Period::new(2024, 8)).map(|b| b.count),
        Some(1)
    );
}

#[test]
fn test_dashboard_summary_from_payload() {
    let offers = parse_offers_payload(PAYLOAD).unwrap();
    let summary = summarize(&offers);

    assert_eq!(summary.total_offers, 6);
    assert_eq!(summary.covered_count, 4);
    assert_eq!(summary.total_savings, dec!(8330.1));
}

#[test]
fn test_comparison_schedule_for_selected_offers() {
    let offers = parse_offers_payload(PAYLOAD).unwrap();

    let covered = offers
        .iter()
        .find(|o| o.offer_id.as_deref() == Some("VOT-08"))
        .unwrap();
    assert_eq!(covered.loan_type, LoanType::Automobile);

    let schedule = covered.comparison_schedule().unwrap();
    assert_eq!(schedule.points.len(), 48);
    assert_eq!(schedule.elapsed + schedule.remaining, 48);
    assert!(schedule.points.iter().all(|p| p.current_payment == schedule.current_payment));
    assert_eq!(
        schedule.projection().count() as u32,
        schedule.remaining
    );

    let uncovered = offers
        .iter()
        .find(|o| o.offer_id.as_deref() == Some("VOT-09"))
        .unwrap();
    assert_eq!(
        uncovered.comparison_schedule(),
        Err(FinancingError::NoCounterOffer)
    );
}
