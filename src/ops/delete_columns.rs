use crate::layer::VectorLayer;

/// Drops named columns from the schema and every feature row.
/// Names not present in the layer are ignored.
#[derive(Debug, Clone)]
pub struct DeleteColumns<'a> {
    pub columns: &'a [&'a str],
}

impl DeleteColumns<'_> {
    pub fn run(&self, input: &VectorLayer) -> VectorLayer {
        let keep: Vec<usize> = input.fields.iter().enumerate()
            .filter(|(_, field)| !self.columns.contains(&field.name.as_ref()))
            .map(|(idx, _)| idx)
            .collect();

        let mut output = input.empty_like(&input.name);
        output.fields = keep.iter().map(|&idx| input.fields[idx].clone()).collect();
        output.features = input.features.iter()
            .map(|feature| {
                let mut trimmed = feature.clone();
                trimmed.values = keep.iter().map(|&idx| feature.values[idx].clone()).collect();
                trimmed
            })
            .collect();
        output
    }
}
