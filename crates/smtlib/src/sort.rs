/// SMT-LIB sort (type) representation.
///
/// Only the sorts the integer/array fragment declares: unbounded integers for
/// scalars and integer-indexed arrays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sort {
    /// Mathematical integer sort
    Int,
    /// Array sort: `(Array index_sort element_sort)`
    Array(Box<Sort>, Box<Sort>),
}

impl Sort {
    /// `(Array Int Int)`, the sort of every source-level array.
    pub fn int_array() -> Self {
        Sort::Array(Box::new(Sort::Int), Box::new(Sort::Int))
    }

    /// Returns `true` for array sorts.
    pub fn is_array(&self) -> bool {
        matches!(self, Sort::Array(..))
    }
}
