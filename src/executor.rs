use crate::{
    ast::Form,
    compiler,
    diagnostics::{GustError, Result},
    runtime::Vm,
    value::Value,
};

/// Compiles and runs one form with the previous result bound as `_`.
///
/// On success the value becomes the VM's previous result. On any failure the
/// previous result is left as it was.
pub fn execute(vm: &mut Vm, form: &Form) -> Result<Value> {
    vm.bind_previous();
    let unit = compiler::compile(form, vm.globals()).map_err(GustError::Compile)?;
    let value = vm.run(&unit)?;
    vm.set_previous(value.clone());
    Ok(value)
}
