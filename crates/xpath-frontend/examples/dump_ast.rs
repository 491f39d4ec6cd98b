use xpath_frontend::{StaticContextBuilder, parse_expression};

fn main() {
    let source = std::env::args().nth(1).unwrap_or_else(|| "for $x in //item[@id] return $x/@id".to_string());
    let ctx = StaticContextBuilder::new().with_namespace("ex", "urn:example").build();
    match parse_expression(&source, &ctx) {
        Ok(expr) => {
            println!("{expr}");
            println!("item type: {}", expr.item_type());
            println!("{expr:#?}");
        }
        Err(err) => eprintln!("{err}"),
    }
}
