mod compiled;
pub use compiled::CompiledStmt;

mod direction;
pub use direction::Direction;

mod field_list;
pub use field_list::{FieldList, Printable};

mod op_compare;
pub use op_compare::CompareOp;

mod op_logic;
pub use op_logic::LogicOp;

mod operand;
pub use operand::{FieldRef, Operand};

mod order_list;
pub use order_list::{OrderEntry, OrderList};

mod ty;
pub use ty::Type;

mod value;
pub use value::Value;

mod where_list;
pub use where_list::{WhereItem, WhereList, WherePart};
