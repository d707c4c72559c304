use crate::core::{CalculationBreakdown, CalculationResult, Expenses, Fees, Taxes, Warning};
use rust_decimal::Decimal;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Debug, Clone, Tabled)]
struct ConceptRow {
    #[tabled(rename = "Concepto")]
    concept: String,
    #[tabled(rename = "Importe")]
    amount: String,
}

impl ConceptRow {
    fn new(concept: &str, amount: Decimal) -> Self {
        ConceptRow {
            concept: concept.to_string(),
            amount: format_eur(amount),
        }
    }
}

pub fn print_expenses(expenses: &Expenses) {
    match expenses {
        Expenses::Buyer(b) => print_breakdown("COSTES DEL COMPRADOR", b, "Coste total"),
        Expenses::Seller(b) => print_breakdown("COSTES DEL VENDEDOR", b, "Total a deducir"),
        Expenses::Combined(r) => print_combined(r),
    }
}

fn print_breakdown(title: &str, breakdown: &CalculationBreakdown, total_label: &str) {
    let mut rows = vec![ConceptRow::new("Precio", breakdown.property_price)];
    rows.extend(item_rows(&breakdown.taxes, &breakdown.fees));
    rows.push(ConceptRow::new(
        "Gastos adicionales",
        breakdown.total_additional_costs,
    ));
    rows.push(ConceptRow::new(total_label, breakdown.total_cost));

    println!();
    println!("{}", title);
    println!();
    println!("{}", table(rows));
    print_explanations(&breakdown.taxes);
    print_warnings(&breakdown.warnings);
}

fn print_combined(result: &CalculationResult) {
    let mut rows = vec![ConceptRow::new("Precio", result.property_price)];
    rows.extend(item_rows(&result.taxes, &result.expenses));
    rows.push(ConceptRow::new("Total impuestos", result.total_taxes));
    rows.push(ConceptRow::new("Total gastos", result.total_expenses));
    rows.push(ConceptRow::new("Coste total", result.total_cost));

    println!();
    println!("COSTES DE LA OPERACIÓN");
    println!();
    println!("{}", table(rows));
    print_explanations(&result.taxes);
    print_warnings(&result.warnings);
}

fn item_rows(taxes: &Taxes, fees: &Fees) -> Vec<ConceptRow> {
    taxes
        .amounts()
        .into_iter()
        .chain(fees.amounts())
        .map(|(label, amount)| ConceptRow::new(label, amount))
        .collect()
}

fn table(rows: Vec<ConceptRow>) -> String {
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string()
}

fn print_explanations(taxes: &Taxes) {
    let explanations = [
        ("ITP", &taxes.itp_explanation),
        ("Plusvalía", &taxes.plusvalia_explanation),
        ("IRPF", &taxes.capital_gains_explanation),
    ];
    let mut printed_header = false;
    for (label, explanation) in explanations {
        let Some(text) = explanation else {
            continue;
        };
        if !printed_header {
            println!();
            printed_header = true;
        }
        println!("  {}: {}", label, text);
    }
    println!();
}

fn print_warnings(warnings: &[Warning]) {
    if warnings.is_empty() {
        return;
    }
    println!("\u{26A0} {} warning(s):", warnings.len());
    for warning in warnings {
        println!("  - {}", warning.message());
    }
    println!();
}

pub fn format_eur(amount: Decimal) -> String {
    format!("{:.2} €", amount)
}
