//! Schema command - print the expected request format

use crate::core::CalculatorRequest;
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format: json-schema or fields
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the request
    JsonSchema,
    /// Field names with descriptions
    Fields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => self.print_json_schema(),
            SchemaFormat::Fields => self.print_fields(),
        }
    }

    fn print_json_schema(&self) -> anyhow::Result<()> {
        let schema = schema_for!(CalculatorRequest);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    fn print_fields(&self) -> anyhow::Result<()> {
        println!("Request Format (JSON)");
        println!("=====================");
        println!();
        for field in CalculatorRequest::field_schema() {
            let req = if field.required { "required" } else { "optional" };
            println!("{:22} ({:8})  {}", field.name, req, field.description);
        }
        println!();
        println!("Amounts are euros; rates and explanations follow Spanish tax rules.");
        Ok(())
    }
}
