use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use cost_estimator::region::Region;

/// Execute the regions command
pub fn execute() {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Code", "Location"]);

    for region in Region::ALL {
        let code = if region == Region::default() {
            Cell::new(format!("{} (default)", region.code())).fg(Color::Green)
        } else {
            Cell::new(region.code())
        };
        table.add_row(vec![code, Cell::new(region.display_name())]);
    }

    println!("{table}");
}
