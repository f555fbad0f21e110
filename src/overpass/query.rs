use crate::models::AreaTable;

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Build an Overpass QL query for the admin boundary relations of every
/// area in the table, scoped to the table's region.
///
/// Aliases get their own selector so renamed relations are still returned.
pub fn build_boundary_query(table: &AreaTable, server_timeout_secs: u64) -> String {
    let mut query = format!(
        "[out:json][timeout:{}];\narea[\"name\"=\"{}\"][\"boundary\"=\"administrative\"]->.searchArea;\n(\n",
        server_timeout_secs,
        escape(table.region())
    );

    for area in table.areas() {
        for name in std::iter::once(&area.name).chain(area.aliases.iter()) {
            query.push_str(&format!(
                "  relation[\"boundary\"=\"administrative\"][\"name\"=\"{}\"](area.searchArea);\n",
                escape(name)
            ));
        }
    }

    query.push_str(");\nout geom;");
    query
}
